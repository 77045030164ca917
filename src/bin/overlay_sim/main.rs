//! Overlay simulator entrypoint: builds a host page, attaches the settings overlay and
//! plays scripted user actions against it.
//!
//! # Host sources
//!
//! - Demo host (default): live listeners, optional render delay or no render at all
//! - `--host-fixture`: static markup from JSON, no host behaviour

mod driver_mode;
mod report;

use anyhow::{Context, Result};
use settings_overlay::dom::{Document, ReadyState};
use settings_overlay::fixture::HostFixture;
use settings_overlay::host_sim::{DemoHost, DemoHostOptions};
use settings_overlay::logging::init_logging;
use settings_overlay::{HostContract, OverlayConfig, Runtime};
use tracing::info;

use crate::driver_mode::{run_live, run_virtual};
use crate::report::SimSummary;

fn main() -> Result<()> {
    let config = OverlayConfig::parse_args()?;
    init_logging(&config);

    let contract = match &config.contract {
        Some(path) => HostContract::load(path)?,
        None => HostContract::default(),
    };
    let script = config.script()?;

    let (doc, demo) = match &config.host_fixture {
        Some(path) => {
            let fixture = HostFixture::load(path)?;
            (fixture.build().context("build host fixture")?, None)
        }
        None => {
            let mut doc = Document::new();
            doc.set_ready_state(ReadyState::Loading);
            // The demo page always renders the stock markup; `--contract` only changes
            // what the overlay expects to find.
            let host = DemoHost::new(HostContract::default(), DemoHostOptions::default());
            (doc, Some(host))
        }
    };

    let mut runtime = Runtime::new(doc, contract, config.timings());
    info!(
        demo = demo.is_some(),
        actions = script.len(),
        realtime = config.realtime,
        "overlay simulation starting"
    );
    runtime.start();
    runtime.mark_document_ready();

    if let Some(host) = &demo {
        if !config.host_never_renders {
            runtime.advance(config.host_render_delay_ms);
            host.render(runtime.doc_mut())
                .context("render demo host")?;
        }
    }

    let outcome = if config.realtime {
        run_live(&mut runtime, &script, config.run_ms)
    } else {
        run_virtual(&mut runtime, &script, config.run_ms)
    };

    let summary = SimSummary::collect(
        &runtime,
        &outcome,
        demo.as_ref().map(DemoHost::observations),
    );
    info!(
        attached = summary.attached,
        tasks = outcome.tasks_run,
        failures = outcome.failures.len(),
        "overlay simulation finished"
    );
    if config.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary.render_text());
    }
    Ok(())
}
