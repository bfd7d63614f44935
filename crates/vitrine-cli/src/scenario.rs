//! Scripted page and input timeline for headless simulation

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use vitrine_core::{ElementId, Error, Rect, Result, ScrollConfig, Viewport};
use vitrine_motion::MemoryDocument;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,
    /// Full-viewport sections at the top of the page
    #[serde(default = "default_sections")]
    pub sections: usize,
    #[serde(default)]
    pub reveal: Option<RevealBlock>,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Keep running this long after the last step
    #[serde(default = "default_tail")]
    pub tail_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevealBlock {
    #[serde(default = "default_main_height")]
    pub main_height: f64,
    /// Zero models a panel whose content has not loaded yet
    #[serde(default)]
    pub reveal_height: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Action {
    Wheel { delta_y: f64 },
    Scroll { y: f64 },
    Resize { width: f64, height: f64 },
    ResizeReveal { height: f64 },
}

fn default_viewport() -> Viewport {
    Viewport::new(1440.0, 900.0)
}

fn default_sections() -> usize {
    4
}

fn default_tail() -> u64 {
    1000
}

fn default_main_height() -> f64 {
    900.0
}

/// Elements making up the reveal block
#[derive(Debug, Clone, Copy)]
pub struct RevealElements {
    pub container: ElementId,
    pub main: ElementId,
    pub reveal: ElementId,
}

pub struct Page {
    pub doc: Arc<MemoryDocument>,
    pub sections: Vec<ElementId>,
    pub reveal: Option<RevealElements>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut scenario: Self =
            toml::from_str(content).map_err(|e| Error::Scenario(e.to_string()))?;
        scenario.validate()?;
        scenario.steps.sort_by_key(|step| step.at_ms);
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return Err(Error::Scenario("viewport must have a positive size".to_string()));
        }
        if self.sections == 0 && self.reveal.is_none() {
            return Err(Error::Scenario(
                "scenario needs at least one section or a reveal block".to_string(),
            ));
        }
        if let Some(reveal) = &self.reveal {
            if reveal.main_height <= 0.0 || reveal.reveal_height < 0.0 {
                return Err(Error::Scenario(
                    "reveal main_height must be positive and reveal_height not negative".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Lay out sections, then the reveal block, then a viewport-high footer
    pub fn build(&self, marker: &str, scroll: &ScrollConfig) -> Page {
        let doc = Arc::new(MemoryDocument::new(self.viewport).with_scroll_config(scroll.clone()));
        let sections = doc.append_sections(marker, self.sections);

        let reveal = self.reveal.as_ref().map(|block| {
            let top = doc.document_height();
            let container = doc.add_element(&["reveal"], Rect::new(top, block.main_height + block.reveal_height));
            let main = doc.add_element(&[], Rect::new(top, block.main_height));
            let reveal = doc.add_element(&[], Rect::new(top + block.main_height, block.reveal_height));
            RevealElements {
                container,
                main,
                reveal,
            }
        });
        doc.append_element(&["footer"], self.viewport.height);

        Page {
            doc,
            sections,
            reveal,
        }
    }
}
