// Category CLI: Brand Research
//
// Launches the persistent-profile browser, runs the research agent on the
// task given on the command line and shuts the browser down again.

use anyhow::{Context, Result};
use kodegen_tools_brand_research::agent::load_preamble;
use kodegen_tools_brand_research::{
    ChatCompletionsClient, Orchestrator, ResearchSession, launch_browser, load_yaml_config,
    open_session_page,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let task = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if task.trim().is_empty() {
        eprintln!("usage: kodegen-brand-research \"<research task>\"");
        std::process::exit(2);
    }

    let config = load_yaml_config().context("Failed to load configuration")?;

    // Fail before the browser starts if the key is missing
    let provider = ChatCompletionsClient::new(&config.llm)?;
    let preamble = load_preamble(config.system_prompt_path.as_deref())?;

    let wrapper = launch_browser(&config.browser).await?;
    let page = match open_session_page(&wrapper).await {
        Ok(page) => page,
        Err(e) => {
            wrapper.shutdown().await;
            return Err(e);
        }
    };

    let session = ResearchSession::new(Box::new(page), config.report_dir.clone());
    let mut orchestrator = Orchestrator::new(provider, session)
        .with_preamble(preamble)
        .with_max_turns(config.max_turns);

    let outcome = orchestrator.run(&task).await;
    drop(orchestrator);
    wrapper.shutdown().await;

    let summary = outcome?;
    if summary.stopped_early {
        warn!(
            "Stopped after {} turn(s) without a final answer ({} action(s) run)",
            summary.turns,
            summary.actions_run()
        );
    } else {
        info!(
            "Done in {} turn(s), {} action(s) run",
            summary.turns,
            summary.actions_run()
        );
    }
    println!("{}", summary.final_answer);

    Ok(())
}
