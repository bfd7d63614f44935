use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use vitrine_core::{AppConfig, Document, Viewport};
use vitrine_motion::viewport::section_index;
use vitrine_motion::{DiscreteScrollNavigator, MemoryDocument, PinnedRevealSequencer, RevealStatus};

use crate::scenario::{Action, Page, Scenario};

/// Give spawned controllers a moment to react before sampling state
const SAMPLE_DELAY: Duration = Duration::from_millis(5);

#[derive(Debug, Serialize)]
struct TraceEntry {
    at_ms: u64,
    event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prevented: Option<bool>,
    scroll_y: f64,
    section: usize,
    installed: bool,
    locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reveal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    translate_y: Option<f64>,
}

struct Simulation {
    page: Page,
    navigator: DiscreteScrollNavigator<MemoryDocument>,
    sequencer: Option<PinnedRevealSequencer<MemoryDocument>>,
    start: Instant,
}

impl Simulation {
    fn apply(&self, action: &Action) -> Result<(String, Option<bool>)> {
        let doc = &self.page.doc;
        match *action {
            Action::Wheel { delta_y } => {
                let event = doc.dispatch_wheel(delta_y);
                Ok((format!("wheel {:+}", delta_y), Some(event.is_default_prevented())))
            }
            Action::Scroll { y } => {
                doc.set_scroll_y(y);
                Ok((format!("scroll {}", y), None))
            }
            Action::Resize { width, height } => {
                doc.set_viewport(Viewport::new(width, height));
                Ok((format!("resize {}x{}", width, height), None))
            }
            Action::ResizeReveal { height } => {
                let reveal = self
                    .page
                    .reveal
                    .context("resize-reveal step needs a [reveal] block")?;
                doc.resize_element(reveal.reveal, height)?;
                Ok((format!("reveal height {}", height), None))
            }
        }
    }

    fn capture(&self, event: String, prevented: Option<bool>) -> TraceEntry {
        let doc = &self.page.doc;
        let scroll_y = doc.scroll_y();
        TraceEntry {
            at_ms: self.start.elapsed().as_millis() as u64,
            event,
            prevented,
            scroll_y,
            section: section_index(scroll_y, doc.viewport().height),
            installed: self.navigator.is_installed(),
            locked: self.navigator.is_locked(),
            reveal: self.sequencer.as_ref().map(|s| describe(s.status())),
            translate_y: self
                .page
                .reveal
                .and_then(|r| doc.style(r.main))
                .map(|style| style.translate_y),
        }
    }
}

fn describe(status: RevealStatus) -> String {
    match status {
        RevealStatus::Active { height } => format!("active({}px)", height),
        other => format!("{:?}", other).to_lowercase(),
    }
}

pub async fn run(config: &AppConfig, scenario_path: &Path, json: bool) -> Result<()> {
    let scenario = Scenario::load(scenario_path)
        .with_context(|| format!("Failed to load scenario {}", scenario_path.display()))?;
    let trace = replay(config, &scenario).await?;

    if json {
        for entry in &trace {
            println!("{}", serde_json::to_string(entry)?);
        }
    } else {
        print_table(&trace);
    }

    Ok(())
}

/// Mount both controllers on the scenario page and play its steps in real time
async fn replay(config: &AppConfig, scenario: &Scenario) -> Result<Vec<TraceEntry>> {
    let page = scenario.build(&config.navigator.section_marker, &config.scroll);
    info!(
        sections = page.sections.len(),
        reveal = page.reveal.is_some(),
        steps = scenario.steps.len(),
        "Starting simulation"
    );

    let navigator = DiscreteScrollNavigator::mount(Arc::clone(&page.doc), config.navigator.clone())?;
    let sequencer = page
        .reveal
        .map(|r| {
            PinnedRevealSequencer::mount(
                Arc::clone(&page.doc),
                r.container,
                vec![r.main, r.reveal],
                config.reveal.clone(),
            )
        })
        .transpose()?;

    let sim = Simulation {
        page,
        navigator,
        sequencer,
        start: Instant::now(),
    };

    let mut trace = Vec::with_capacity(scenario.steps.len() + 1);
    for step in &scenario.steps {
        tokio::time::sleep_until(sim.start + Duration::from_millis(step.at_ms)).await;
        let (event, prevented) = sim.apply(&step.action)?;
        tokio::time::sleep(SAMPLE_DELAY).await;
        trace.push(sim.capture(event, prevented));
    }

    let last = scenario.steps.last().map_or(0, |s| s.at_ms);
    tokio::time::sleep_until(sim.start + Duration::from_millis(last + scenario.tail_ms)).await;
    trace.push(sim.capture("settled".to_string(), None));
    drop(sim);
    debug!(
        entries = trace.len(),
        live_bindings = vitrine_motion::plugins::registry().map_or(0, |r| r.live()),
        "Simulation finished"
    );

    Ok(trace)
}

fn print_table(trace: &[TraceEntry]) {
    println!(
        "{:>7}  {:<22} {:>9} {:>8} {:>7}  {:<9} {:<6} {:<14} {:>9}",
        "t(ms)", "event", "prevented", "scroll", "section", "listening", "locked", "reveal", "translate"
    );
    for entry in trace {
        let prevented = entry.prevented.map_or("-", |p| if p { "yes" } else { "no" });
        let translate = entry
            .translate_y
            .map_or_else(|| "-".to_string(), |t| format!("{:.1}", t));
        println!(
            "{:>7}  {:<22} {:>9} {:>8.1} {:>7}  {:<9} {:<6} {:<14} {:>9}",
            entry.at_ms,
            entry.event,
            prevented,
            entry.scroll_y,
            entry.section,
            if entry.installed { "yes" } else { "no" },
            if entry.locked { "yes" } else { "no" },
            entry.reveal.as_deref().unwrap_or("-"),
            translate,
        );
    }
}
