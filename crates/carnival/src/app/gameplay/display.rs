/// A single line of HUD text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextLabel {
    text: String,
}

impl TextLabel {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A toggleable overlay with its own text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Panel {
    visible: bool,
    text: String,
}

impl Panel {
    pub fn set_active(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
