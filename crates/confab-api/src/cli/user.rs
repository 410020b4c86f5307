//! User identity commands: login, logout, whoami.

use console::style;

use confab_core::repository::UserStore;
use confab_types::chat::User;

use crate::state::AppState;

/// Save the user that later `chat` and `history` commands act as.
pub async fn login(state: &AppState, user_id: &str, username: &str, json: bool) -> anyhow::Result<()> {
    let user_id = user_id.trim();
    let username = username.trim();
    if user_id.is_empty() || username.is_empty() {
        anyhow::bail!("User id and username must not be empty");
    }

    let user = User {
        user_id: user_id.to_string(),
        username: username.to_string(),
    };
    state.user_store.save(&user).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!(
            "\n  {} Logged in as {} ({})\n",
            style("✓").green().bold(),
            style(&user.username).cyan().bold(),
            style(&user.user_id).dim()
        );
    }
    Ok(())
}

pub async fn logout(state: &AppState, json: bool) -> anyhow::Result<()> {
    state.user_store.clear().await?;
    if json {
        println!("{}", serde_json::json!({ "logged_out": true }));
    } else {
        println!("\n  {} Logged out\n", style("✓").green().bold());
    }
    Ok(())
}

pub async fn whoami(state: &AppState, json: bool) -> anyhow::Result<()> {
    let user = state.user_store.load().await?;
    match (user, json) {
        (Some(user), true) => println!("{}", serde_json::to_string_pretty(&user)?),
        (None, true) => println!("null"),
        (Some(user), false) => println!(
            "\n  {} ({})\n",
            style(&user.username).cyan().bold(),
            style(&user.user_id).dim()
        ),
        (None, false) => println!(
            "\n  {} Not logged in. Run: confab login --user-id <id> --username <name>\n",
            style("!").yellow().bold()
        ),
    }
    Ok(())
}
