//! The interactive menu loop.

use crate::display;

use super::commands::{read_line, App};

/// Run the interactive menu until the user quits or stdin closes.
pub async fn run_menu(app: &mut App) {
    loop {
        display::print_menu();
        display::print_prompt("choice");
        let choice = match read_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!(error = %e, "stdin closed, leaving menu");
                break;
            }
        };

        let result = match choice.as_str() {
            "1" => app.profile().await,
            "2" => {
                display::print_prompt("URL or text");
                match read_line().await {
                    Ok(input) if !input.is_empty() => app.process(&[input]).await,
                    Ok(_) => {
                        display::print_info("Nothing to process.");
                        Ok(())
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "stdin closed, leaving menu");
                        break;
                    }
                }
            }
            "3" => app.reinforce().await,
            "4" => app.suggest().await,
            "5" => app.reflect().await,
            "6" => {
                app.stats();
                Ok(())
            }
            "7" => app.reset().await,
            "q" | "quit" | "exit" => break,
            "" => continue,
            other => {
                display::print_error(&format!("Unknown choice: {other}"));
                Ok(())
            }
        };

        if let Err(e) = result {
            display::print_error(&e.to_string());
        }
    }
}
