//! Sample build description: a tiny C++ "game" with a shared library of
//! sources and two executables (the game itself and its test binary),
//! matching the end-to-end scenario the engine's invariants are specified
//! against. Run with `maek [target ...]`; defaults to building everything.

use clap::Parser;
use color_eyre::eyre::Result;
use maek::{Maek, TargetId};

#[derive(Parser, Debug)]
#[command(name = "maek", about = "A small, hackable, content-addressed parallel build engine")]
struct Cli {
    /// Targets to build. Defaults to every default target if none are given.
    targets: Vec<String>,

    /// Override the number of concurrent build commands (default: CPUs + 1).
    #[arg(long)]
    jobs: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    maek::log::init();

    let cli = Cli::parse();

    let mut maek = Maek::new().await?;
    if let Some(jobs) = cli.jobs {
        maek = maek.with_jobs(jobs);
    }

    let default_target = describe(&maek)?;

    let roots: Vec<TargetId> = if cli.targets.is_empty() {
        vec![default_target]
    } else {
        cli.targets.into_iter().map(TargetId::new).collect()
    };

    match maek.update(roots).await {
        Ok(()) => Ok(()),
        Err(maek::MaekError::Build(e)) => {
            eprintln!("FAILED: {e}");
            std::process::exit(1);
        }
        Err(maek::MaekError::Internal(report)) => {
            Err(std::sync::Arc::try_unwrap(report).unwrap_or_else(|arc| color_eyre::eyre::eyre!("{arc:?}")))
        }
    }
}

/// Register the game's tasks and return the `:dist` abstract target that
/// groups the game executable for a default `maek` invocation.
fn describe(maek: &Maek) -> Result<TargetId> {
    let player_o = maek.cpp("src/Player.cpp", None)?;
    let level_o = maek.cpp("src/Level.cpp", None)?;
    let game_o = maek.cpp("src/game.cpp", None)?;
    let test_o = maek.cpp("src/test.cpp", None)?;

    let game_exe = maek.link([player_o.clone(), level_o.clone(), game_o], "dist/game", None)?;
    let test_exe = maek.link([player_o, level_o, test_o], "test/game-test", None)?;

    maek.rule([":dist"], [game_exe], vec![]);
    maek.rule([":test"], [test_exe.clone()], vec![vec![test_exe.as_str().to_string()]]);

    Ok(TargetId::new(":dist"))
}
