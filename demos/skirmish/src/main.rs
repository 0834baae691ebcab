use std::path::Path;
use std::sync::Arc;

use warbot::prelude::*;
use warbot::telemetry::init_tracing;

// ---------------------------------------------------------------------------
// Cast
// ---------------------------------------------------------------------------

const MODERATOR_ROLE: RoleId = RoleId(900);
const MODERATOR: MemberId = MemberId(1);
const EMBER_LEADER: MemberId = MemberId(10);
const ROOKS_LEADER: MemberId = MemberId(20);

async fn seed(backend: &MemoryBackend) {
    backend.permissions.grant_role(MODERATOR, MODERATOR_ROLE).await;
    backend
        .entities
        .insert(Guild {
            name: "Ember".into(),
            leader: EMBER_LEADER,
            co_leader: Some(MemberId(11)),
            members: vec![EMBER_LEADER, MemberId(12), MemberId(13)],
            score: Score::default(),
        })
        .await;
    backend
        .entities
        .insert(Team {
            name: "Rooks".into(),
            leader: ROOKS_LEADER,
            members: vec![MemberId(21), MemberId(22)],
            score: Score::default(),
        })
        .await;
}

/// The scripted war: one mistake, then a best-of-3 that goes the distance.
fn script(thread_id: ThreadId) -> Vec<Interaction> {
    let at = |actor, action| Interaction {
        thread_id,
        actor,
        action,
    };
    let report = |winner: &str, round| WarAction::ReportRound {
        winner: winner.into(),
        round,
    };
    vec![
        at(EMBER_LEADER, WarAction::Accept),
        at(ROOKS_LEADER, WarAction::Accept),
        at(MODERATOR, report("Rooks", 1)),
        at(MODERATOR, report("Rooks", 1)),
        at(MODERATOR, report("Ember", 2)),
        at(ROOKS_LEADER, WarAction::DeclareDodge {
            dodging: "Ember".into(),
        }),
        at(MODERATOR, report("Ember", 3)),
    ]
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

async fn play(bot: &WarBot<MemoryBackend>, thread_id: ThreadId) -> Result<Vec<Reply>, WarBotError> {
    bot.open_war(thread_id, EntityRef::guild("Ember"), EntityRef::team("Rooks"))
        .await?;
    let mut replies = Vec::new();
    for interaction in script(thread_id) {
        let reply = bot.handle(interaction).await;
        println!("> {}", reply.render());
        replies.push(reply);
    }
    Ok(replies)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("info");

    let config = match std::env::args().nth(1) {
        Some(path) => BotConfig::from_path(Path::new(&path))?,
        None => BotConfig {
            staff: StaffRoles {
                moderator_role: Some(MODERATOR_ROLE),
                score_operator_role: None,
            },
            ..BotConfig::default()
        },
    };

    let backend = Arc::new(
        MemoryBackend::new(config.staff.roles()).with_audit_channel(config.audit_channel),
    );
    seed(&backend).await;
    let bot = WarBot::builder().config(config).build(Arc::clone(&backend))?;

    let mut events = bot.subscribe();
    play(&bot, ThreadId(1)).await?;

    while let Ok(event) = events.try_recv() {
        println!("event: {}", serde_json::to_string(&event)?);
    }
    for member in [EMBER_LEADER, MemberId(21)] {
        if let Some(profile) = backend.profiles.peek(member).await {
            println!("{member}: {}", profile.personal_score);
        }
    }

    bot.shutdown().await;
    Ok(())
}
