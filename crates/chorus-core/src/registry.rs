//! The active set of bots, in insertion order.

use chorus_types::bot::{BotColor, BotConfig, BotId, CreateBotRequest, MAX_BOTS};
use chorus_types::error::{SessionError, ValidationError};

/// Ordered collection of at most [`MAX_BOTS`] bots with unique names.
#[derive(Debug, Clone, Default)]
pub struct BotRegistry {
    bots: Vec<BotConfig>,
}

impl BotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bot, assigning it the palette color for the current slot.
    ///
    /// Name and prompt are trimmed before validation. Nothing changes when
    /// an error is returned.
    pub fn add(&mut self, request: CreateBotRequest) -> Result<&BotConfig, ValidationError> {
        if self.bots.len() >= MAX_BOTS {
            return Err(ValidationError::RegistryFull);
        }
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let prompt = request.prompt.trim();
        if prompt.is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        if self.find_by_name(name).is_some() {
            return Err(ValidationError::DuplicateName(name.to_string()));
        }

        let color = BotColor::for_slot(self.bots.len());
        let bot = BotConfig::new(name.to_string(), request.model, prompt.to_string(), color);
        tracing::info!(bot = %bot.name, model = %bot.model, %color, "bot added");
        self.bots.push(bot);
        Ok(&self.bots[self.bots.len() - 1])
    }

    /// Replace a bot's role prompt, regenerating its system message.
    pub fn edit_prompt(&mut self, id: BotId, prompt: &str) -> Result<&BotConfig, SessionError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ValidationError::EmptyPrompt.into());
        }
        let bot = self.get_mut(id).ok_or(SessionError::BotNotFound)?;
        bot.set_role_prompt(prompt.to_string());
        tracing::info!(bot = %bot.name, "bot prompt updated");
        Ok(bot)
    }

    /// Remove a bot. Later bots keep their relative order.
    pub fn delete(&mut self, id: BotId) -> Result<BotConfig, SessionError> {
        let index = self
            .bots
            .iter()
            .position(|b| b.id == id)
            .ok_or(SessionError::BotNotFound)?;
        let bot = self.bots.remove(index);
        tracing::info!(bot = %bot.name, "bot deleted");
        Ok(bot)
    }

    pub fn clear(&mut self) {
        self.bots.clear();
    }

    pub fn get(&self, id: BotId) -> Option<&BotConfig> {
        self.bots.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: BotId) -> Option<&mut BotConfig> {
        self.bots.iter_mut().find(|b| b.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&BotConfig> {
        self.bots.iter().find(|b| b.name == name)
    }

    /// Color of the active bot called `name`, gray if there is none.
    pub fn color_of(&self, name: &str) -> BotColor {
        self.find_by_name(name)
            .map(|b| b.color)
            .unwrap_or(BotColor::Gray)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BotConfig> {
        self.bots.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, BotConfig> {
        self.bots.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.bots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }

    /// Forget every recorded turn, keeping each bot's system message.
    pub fn reset_histories(&mut self) {
        for bot in &mut self.bots {
            bot.reset_history();
        }
    }
}

impl<'a> IntoIterator for &'a BotRegistry {
    type Item = &'a BotConfig;
    type IntoIter = std::slice::Iter<'a, BotConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.bots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_types::bot::ModelId;
    use chorus_types::llm::MessageRole;

    fn req(name: &str) -> CreateBotRequest {
        CreateBotRequest {
            name: name.to_string(),
            model: ModelId::Gpt4oMini,
            prompt: format!("{name} is curious"),
        }
    }

    fn names(registry: &BotRegistry) -> Vec<&str> {
        registry.iter().map(|b| b.name.as_str()).collect()
    }

    #[test]
    fn add_assigns_palette_colors_in_order() {
        let mut registry = BotRegistry::new();
        for name in ["A", "B", "C"] {
            registry.add(req(name)).unwrap();
        }
        let colors: Vec<BotColor> = registry.iter().map(|b| b.color).collect();
        assert_eq!(colors, vec![BotColor::Red, BotColor::Teal, BotColor::Blue]);
    }

    #[test]
    fn new_bot_history_is_single_system_message() {
        let mut registry = BotRegistry::new();
        let bot = registry.add(req("Ada")).unwrap();
        assert_eq!(bot.history.len(), 1);
        assert_eq!(bot.history[0].role, MessageRole::System);
        assert!(bot.system_prompt().contains("Ada is curious"));
    }

    #[test]
    fn sixth_bot_is_rejected() {
        let mut registry = BotRegistry::new();
        for name in ["A", "B", "C", "D", "E"] {
            registry.add(req(name)).unwrap();
        }
        let err = registry.add(req("F")).unwrap_err();
        assert_eq!(err, ValidationError::RegistryFull);
        assert_eq!(registry.len(), MAX_BOTS);
        assert!(registry.find_by_name("F").is_none());
    }

    #[test]
    fn blank_name_or_prompt_is_rejected() {
        let mut registry = BotRegistry::new();
        let mut blank_name = req("A");
        blank_name.name = "   ".to_string();
        assert_eq!(registry.add(blank_name).unwrap_err(), ValidationError::EmptyName);

        let mut blank_prompt = req("A");
        blank_prompt.prompt = "\n\t".to_string();
        assert_eq!(registry.add(blank_prompt).unwrap_err(), ValidationError::EmptyPrompt);
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut registry = BotRegistry::new();
        registry.add(req("Ada")).unwrap();
        let err = registry.add(req(" Ada ")).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateName("Ada".to_string()));
    }

    #[test]
    fn delete_keeps_order_and_colors_may_repeat() {
        let mut registry = BotRegistry::new();
        for name in ["A", "B", "C"] {
            registry.add(req(name)).unwrap();
        }
        let b = registry.find_by_name("B").unwrap().id;
        let deleted = registry.delete(b).unwrap();
        assert_eq!(deleted.name, "B");
        assert_eq!(names(&registry), vec!["A", "C"]);

        let d = registry.add(req("D")).unwrap();
        assert_eq!(d.color, BotColor::Blue);
        assert_eq!(registry.find_by_name("C").unwrap().color, BotColor::Blue);
    }

    #[test]
    fn edit_prompt_regenerates_system_message() {
        let mut registry = BotRegistry::new();
        let id = registry.add(req("Ada")).unwrap().id;
        let bot = registry.edit_prompt(id, "  a grumpy pirate ").unwrap();
        assert_eq!(bot.role_prompt, "a grumpy pirate");
        assert!(bot.system_prompt().contains("a grumpy pirate"));
        assert_eq!(bot.history.len(), 1);
    }

    #[test]
    fn edit_prompt_errors() {
        let mut registry = BotRegistry::new();
        let id = registry.add(req("Ada")).unwrap().id;
        assert!(matches!(
            registry.edit_prompt(id, " "),
            Err(SessionError::Validation(ValidationError::EmptyPrompt))
        ));
        assert!(matches!(
            registry.edit_prompt(BotId::new(), "fine"),
            Err(SessionError::BotNotFound)
        ));
    }

    #[test]
    fn delete_unknown_bot_is_not_found() {
        let mut registry = BotRegistry::new();
        assert!(matches!(
            registry.delete(BotId::new()),
            Err(SessionError::BotNotFound)
        ));
    }

    #[test]
    fn color_of_falls_back_to_gray() {
        let mut registry = BotRegistry::new();
        registry.add(req("Ada")).unwrap();
        assert_eq!(registry.color_of("Ada"), BotColor::Red);
        assert_eq!(registry.color_of("Ghost"), BotColor::Gray);
    }
}
