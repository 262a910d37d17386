use std::collections::HashMap;

use ratatui::style::{Color, Style};

/// The two colour schemes the window can be shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Light
    }
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Caption of the button that switches away from this theme.
    pub fn toggle_caption(self) -> &'static str {
        match self {
            Theme::Light => "Dark Mode",
            Theme::Dark => "Light Mode",
        }
    }

    /// The fixed colour mapping of each role under this theme.
    pub fn style(self, role: Role) -> Style {
        match (self, role) {
            (Theme::Light, Role::Background) => Style::default().bg(Color::White).fg(Color::Black),
            (Theme::Light, Role::Label) => Style::default().bg(Color::White).fg(Color::Black),
            (Theme::Light, Role::Button) => Style::default().bg(Color::Rgb(0xcc, 0xcc, 0xcc)).fg(Color::Black),
            (Theme::Light, Role::Input) => Style::default().bg(Color::Rgb(0xd3, 0xd3, 0xd3)).fg(Color::Black),
            (Theme::Dark, Role::Background) => Style::default().bg(Color::Rgb(0x2e, 0x2e, 0x2e)).fg(Color::White),
            (Theme::Dark, Role::Label) => Style::default().bg(Color::Rgb(0x2e, 0x2e, 0x2e)).fg(Color::White),
            (Theme::Dark, Role::Button) => Style::default().bg(Color::Rgb(0x55, 0x55, 0x55)).fg(Color::White),
            (Theme::Dark, Role::Input) => Style::default().bg(Color::Rgb(0x44, 0x44, 0x44)).fg(Color::White),
        }
    }
}

/// What a widget is, as far as colouring goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Background,
    Label,
    Button,
    Input,
}

/// Every widget of the window that takes part in theming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetId {
    Window,
    UserLabel,
    DescriptionLabel,
    UserInput,
    DescriptionInput,
    StartButton,
    EndButton,
    ThemeButton,
    Table,
    StatusLine,
}

/// Styles of the registered widgets under the current theme. The
/// `(widget, role)` pairs are fixed when the registry is built and
/// `apply` walks them to recolour everything at once.
#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    theme: Theme,
    entries: Vec<(WidgetId, Role)>,
    styles: HashMap<WidgetId, Style>,
}

impl ThemeRegistry {
    pub fn new(entries: Vec<(WidgetId, Role)>) -> ThemeRegistry {
        let mut registry = ThemeRegistry {
            theme: Theme::default(),
            entries,
            styles: HashMap::new(),
        };
        registry.apply();
        registry
    }

    /// The registry used by the task window.
    pub fn for_window() -> ThemeRegistry {
        ThemeRegistry::new(vec![
            (WidgetId::Window, Role::Background),
            (WidgetId::UserLabel, Role::Label),
            (WidgetId::DescriptionLabel, Role::Label),
            (WidgetId::UserInput, Role::Input),
            (WidgetId::DescriptionInput, Role::Input),
            (WidgetId::StartButton, Role::Button),
            (WidgetId::EndButton, Role::Button),
            (WidgetId::ThemeButton, Role::Button),
            (WidgetId::Table, Role::Label),
            (WidgetId::StatusLine, Role::Label),
        ])
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn toggle(&mut self) {
        self.theme = self.theme.toggled();
        self.apply();
    }

    fn apply(&mut self) {
        for (widget, role) in &self.entries {
            self.styles.insert(*widget, self.theme.style(*role));
        }
    }

    /// Style of a widget; unregistered widgets keep the terminal default.
    pub fn style(&self, widget: WidgetId) -> Style {
        self.styles.get(&widget).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_light() {
        let registry = ThemeRegistry::for_window();
        assert_eq!(registry.theme(), Theme::Light);
        assert_eq!(registry.theme().toggle_caption(), "Dark Mode");
        assert_eq!(
            registry.style(WidgetId::StartButton),
            Theme::Light.style(Role::Button)
        );
    }

    #[test]
    fn test_toggle_recolours_every_widget() {
        let mut registry = ThemeRegistry::for_window();
        let light = registry.clone();
        registry.toggle();

        assert_eq!(registry.theme(), Theme::Dark);
        assert_eq!(registry.theme().toggle_caption(), "Light Mode");
        for (widget, role) in &light.entries {
            assert_eq!(registry.style(*widget), Theme::Dark.style(*role));
            assert_ne!(registry.style(*widget), light.style(*widget));
        }
    }

    #[test]
    fn test_toggle_twice_restores_colours() {
        let mut registry = ThemeRegistry::for_window();
        let before = registry.styles.clone();
        registry.toggle();
        registry.toggle();
        assert_eq!(registry.theme(), Theme::Light);
        assert_eq!(registry.styles, before);
    }

    #[test]
    fn test_unregistered_widget_uses_default_style() {
        let registry = ThemeRegistry::new(vec![(WidgetId::Window, Role::Background)]);
        assert_eq!(registry.style(WidgetId::Table), Style::default());
    }
}
