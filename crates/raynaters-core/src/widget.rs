//! Companion widget state: open/collapsed view and the nudge line shown for
//! the page section currently in view.

const DEFAULT_NUDGE: &str = "Systems operational.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetView {
    #[default]
    Collapsed,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Hero,
    Features,
    Testimonials,
    Automation,
    Contact,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Hero => "hero",
            Section::Features => "features",
            Section::Testimonials => "testimonials",
            Section::Automation => "automation",
            Section::Contact => "contact",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "hero" => Some(Section::Hero),
            "features" => Some(Section::Features),
            "testimonials" => Some(Section::Testimonials),
            "automation" => Some(Section::Automation),
            "contact" => Some(Section::Contact),
            _ => None,
        }
    }

    pub fn all() -> Vec<Section> {
        vec![
            Section::Hero,
            Section::Features,
            Section::Testimonials,
            Section::Automation,
            Section::Contact,
        ]
    }

    pub fn nudge(&self) -> &'static str {
        match self {
            Section::Hero => "Welcome to Raynaters. I am your navigator.",
            Section::Features => "Scanning intelligence stack... Which module interests you?",
            Section::Testimonials => "Analysis: 99.9% positive sentiment from current partners.",
            Section::Automation => "I can architect a custom solution for you right now.",
            Section::Contact => "Ready to deploy? Let's get you connected.",
        }
    }
}

/// Line to show for any context key; unknown keys get the default.
pub fn nudge_for(id: &str) -> &'static str {
    Section::from_id(id).map_or(DEFAULT_NUDGE, |s| s.nudge())
}

#[derive(Debug, Clone, Default)]
pub struct CompanionWidget {
    view: WidgetView,
    section: Option<Section>,
    bubble: Option<&'static str>,
}

impl CompanionWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> WidgetView {
        self.view
    }

    pub fn section(&self) -> Option<Section> {
        self.section
    }

    /// Speech bubble text, only ever set while collapsed.
    pub fn bubble(&self) -> Option<&'static str> {
        self.bubble
    }

    pub fn toggle(&mut self) -> WidgetView {
        self.view = match self.view {
            WidgetView::Collapsed => {
                self.bubble = None;
                WidgetView::Open
            }
            WidgetView::Open => WidgetView::Collapsed,
        };
        self.view
    }

    /// Record that the page section `id` scrolled into view.
    pub fn enter_section(&mut self, id: &str) {
        self.section = Section::from_id(id);
        if self.view == WidgetView::Collapsed {
            self.bubble = Some(nudge_for(id));
        }
    }
}
