use std::env;

use levelup::prelude::*;

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// `levelup-console [BASE_URL] [USERNAME] [PASSWORD]`
///
/// The session is kept in `levelup-session.json` in the working
/// directory, so a second run skips the login.
struct Args {
    base_url: String,
    username: String,
    password: String,
}

impl Args {
    fn parse() -> Self {
        let mut args = env::args().skip(1);
        Self {
            base_url: args.next().unwrap_or_else(|| "http://127.0.0.1:5000".into()),
            username: args.next().unwrap_or_else(|| "admin".into()),
            password: args.next().unwrap_or_else(|| "admin".into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_leaderboard(users: &[User]) {
    println!("{:<4} {:<20} {:>6} {:>5}  badges", "#", "name", "xp", "lvl");
    for (rank, user) in users.iter().enumerate() {
        let bar_len = (user.level_progress() * 10.0).round() as usize;
        println!(
            "{:<4} {:<20} {:>6} {:>5}  [{:<10}] {}",
            rank + 1,
            user.name,
            user.xp,
            user.level,
            "#".repeat(bar_len),
            user.badges.join(", "),
        );
    }
}

fn print_rewards(rewards: &[Reward], xp: Option<u32>) {
    for reward in rewards {
        let marker = match xp {
            Some(xp) if reward.xp_cost <= xp => "*",
            _ => " ",
        };
        println!("{marker} {:<4} {:<24} {:>5} xp", reward.id.0, reward.name, reward.xp_cost);
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), LevelupError> {
    init_tracing()?;
    let args = Args::parse();

    let portal = Portal::builder()
        .base_url(&args.base_url)
        .store_path("levelup-session.json")
        .build()?;

    if portal.session().guard() == RouteDecision::RedirectToLogin {
        let result = portal.login(&args.username, &args.password).await;
        println!("{}", Notice::from_result(&result, "logged in"));
        result?;
    }

    if let Err(e) = portal.refresh_all().await {
        println!("{}", Notice::error(e.to_string()));
        if e.requires_login() {
            return Err(e);
        }
    }

    // Give the lowest-ranked user a nudge.
    if let Some(last) = portal.users().leaderboard().last() {
        let result = portal.users().grant_default_xp(last.id).await;
        println!(
            "{}",
            Notice::from_result(&result, &format!("{DEFAULT_XP_GRANT} XP granted to {}", last.name))
        );
    }

    println!();
    print_leaderboard(&portal.users().leaderboard());

    println!();
    let xp = portal.current_user().map(|u| u.xp);
    print_rewards(&portal.rewards().rewards(), xp);

    tracing::info!(user = ?portal.session().username(), "done");
    Ok(())
}
