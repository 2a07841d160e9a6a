//! `ragsync watch`: render live progress until processing finishes

use colored::Colorize;

use crate::commands::{describe_snapshot, print_progress, start_runtime};
use crate::config::Config;
use crate::error::Result;
use crate::live::{ConnectionPhase, LiveState};
use crate::runtime::SessionRuntime;

/// Start a runtime and follow its progress
pub async fn run_watch(config: &Config) -> Result<()> {
    let runtime = start_runtime(config).await?;
    follow(&runtime).await;
    runtime.teardown().await;
    Ok(())
}

/// What a watcher has already printed, so only changes are shown
#[derive(Debug, Default, PartialEq)]
struct Rendered {
    line: Option<String>,
    connected: bool,
}

/// Print progress changes until the job finishes or Ctrl-C is pressed
pub(crate) async fn follow(runtime: &SessionRuntime) {
    let Some(mut rx) = runtime.subscribe() else {
        return;
    };

    println!("{} {}", "Session:".bold(), runtime.token().cyan());
    let mut rendered = Rendered::default();

    loop {
        let state = rx.borrow_and_update().clone();
        render_change(&state, &mut rendered);

        if state.phase.is_final() {
            break;
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("{}", "Stopped watching.".yellow());
                return;
            }
        }
    }

    println!();
    print_progress(&rx.borrow().clone());
}

fn render_change(state: &LiveState, rendered: &mut Rendered) {
    if state.connected != rendered.connected {
        rendered.connected = state.connected;
        if state.connected {
            println!("{}", "Connected to progress stream.".green());
        } else if state.phase == ConnectionPhase::ReconnectScheduled {
            println!("{}", "Disconnected, reconnecting...".yellow());
        }
    }

    let line = state.snapshot.as_ref().map(describe_snapshot);
    if line.is_some() && line != rendered.line {
        if let Some(text) = &line {
            println!("{}", text);
        }
        rendered.line = line;
    }
}
