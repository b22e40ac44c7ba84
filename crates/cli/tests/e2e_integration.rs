//! End-to-end tests for AgentQuest: world generation followed by play,
//! driven through `ProviderExecutor` by a scripted LLM provider.
//!
//! The provider decides what to answer by looking at the request (persona,
//! task text, tool results so far), so these tests exercise the real prompt
//! rendering, tool loop, persistence and marker parsing.

use std::sync::{Arc, Mutex};

use agentquest_config::roster::{parse_roster_toml, sample_roster_toml};
use agentquest_core::error::ProviderError;
use agentquest_core::game::GameState;
use agentquest_core::message::{Message, MessageToolCall, Role};
use agentquest_core::provider::{Provider, ProviderRequest, ProviderResponse, ResponseFormat, Usage};
use agentquest_core::world::WorldState;
use agentquest_crew::{
    GameSession, ProviderExecutor, RoundEvent, RoundOutcome, SessionOptions, TaskExecutor, WorldGenerator, store,
};

// ── Scripted Provider ────────────────────────────────────────────────────

type Script = dyn Fn(&ProviderRequest) -> ProviderResponse + Send + Sync;

/// A provider that answers each request through a script and records it.
struct ScriptedProvider {
    script: Box<Script>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(script: impl Fn(&ProviderRequest) -> ProviderResponse + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let response = (self.script)(&request);
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock".into(),
    }
}

fn tool_response(name: &str, args: serde_json::Value) -> ProviderResponse {
    let mut msg = Message::assistant("");
    msg.tool_calls = vec![MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }];
    ProviderResponse {
        message: msg,
        usage: None,
        model: "mock".into(),
    }
}

fn executor(provider: Arc<ScriptedProvider>) -> Arc<dyn TaskExecutor> {
    Arc::new(ProviderExecutor::new(provider, "mock-model").with_max_tool_iterations(4))
}

fn system_prompt(request: &ProviderRequest) -> &str {
    request
        .messages
        .iter()
        .find(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

fn task_prompt(request: &ProviderRequest) -> &str {
    request
        .messages
        .iter()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

fn tool_outputs(request: &ProviderRequest) -> Vec<&str> {
    request
        .messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.content.as_str())
        .collect()
}

fn world_json(approved: bool) -> serde_json::Value {
    serde_json::json!({
        "setting": "A frozen northern kingdom",
        "lore": "The sun has not risen in a century.",
        "factions": ["Frost Clan", "Ember Cult"],
        "locations": [
            {
                "name": "Stormkeep",
                "description": "A fortress of black ice.",
                "connected_to": ["Ice Caves"],
                "npcs_present": ["Jarl Eirik"]
            },
            {
                "name": "Ice Caves",
                "description": "Tunnels full of whispers.",
                "connected_to": ["Stormkeep"],
                "npcs_present": []
            }
        ],
        "npcs": [{
            "name": "Jarl Eirik",
            "role": "Ruler",
            "personality": "Proud and tired",
            "attitude_toward_party": "neutral",
            "backstory": "Lost his son to the dark."
        }],
        "main_quest": {
            "title": "Relight the Sun",
            "description": "Carry the ember to the peak.",
            "objectives": ["Find the ember", "Climb the peak"],
            "twists": ["The Jarl wants the dark to stay"],
            "is_main_quest": true
        },
        "side_quests": [],
        "consistency_approved": approved,
        "consistency_issues": if approved { "" } else { "Ice Caves has no way back to Stormkeep" }
    })
}

/// Generation script: the checker rejects the first draft, then approves.
fn generation_script() -> impl Fn(&ProviderRequest) -> ProviderResponse + Send + Sync + 'static {
    let checks = Mutex::new(0u32);
    move |request| {
        let persona = system_prompt(request);
        if persona.starts_with("You are Consistency Checker") {
            let mut n = checks.lock().unwrap();
            *n += 1;
            text_response(&world_json(*n > 1).to_string())
        } else if persona.starts_with("You are World Builder") {
            text_response("Setting: a frozen north. Locations: Stormkeep, Ice Caves.")
        } else if persona.starts_with("You are Character Creator") {
            text_response("Jarl Eirik rules Stormkeep.")
        } else {
            text_response("Main quest: Relight the Sun.")
        }
    }
}

/// Play script. The Dungeon Master looks up the setting before describing
/// the scene and rolls a d20 before resolving. The resolution of round
/// `game_over_round` ends the game.
fn play_script(game_over_round: u32) -> impl Fn(&ProviderRequest) -> ProviderResponse + Send + Sync + 'static {
    move |request| {
        let persona = system_prompt(request);
        let task = task_prompt(request);
        let tools_used = tool_outputs(request);

        if persona.starts_with("You are Dungeon Master") {
            if task.contains("Describe the current situation") {
                if tools_used.is_empty() {
                    return tool_response("query_world_state", serde_json::json!({"section": "setting"}));
                }
                return text_response("Snow swirls around the gates of Stormkeep.");
            }
            if tools_used.is_empty() {
                return tool_response("roll_dice", serde_json::json!({"notation": "1d20+2"}));
            }
            let status = if task.contains(&format!("Round: {game_over_round}")) {
                "STATUS: GAME_OVER"
            } else {
                "STATUS: CONTINUE"
            };
            return text_response(&format!("The gates creak open. {}\n{status}", tools_used[0]));
        }

        if persona.starts_with("You are Chronicler") {
            return text_response("The party arrived and fought through the cold.");
        }

        // A player: check the sheet once, then act.
        if tools_used.is_empty() {
            let name = persona
                .trim_start_matches("You are ")
                .split('.')
                .next()
                .unwrap_or("")
                .to_string();
            return tool_response("character_sheet", serde_json::json!({"character_name": name}));
        }
        text_response("I step forward and knock on the gate.")
    }
}

// ── E2E: World Generation ────────────────────────────────────────────────

#[tokio::test]
async fn e2e_generation_retries_rejected_world_then_saves() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(generation_script());

    let world = WorldGenerator::new(executor(provider.clone()), dir.path())
        .with_max_iterations(3)
        .run("A frozen northern kingdom")
        .await
        .unwrap();

    assert!(world.consistency_approved);
    assert_eq!(world.seed, "A frozen northern kingdom");
    assert_eq!(world.locations.len(), 2);

    // Two full crews of four steps each
    let requests = provider.requests();
    assert_eq!(requests.len(), 8);

    // Only the checker asks for JSON, and it carries the world schema
    for (i, request) in requests.iter().enumerate() {
        let is_checker = i % 4 == 3;
        match &request.response_format {
            ResponseFormat::Json { schema: Some(schema) } => {
                assert!(is_checker, "request {i} should not ask for JSON");
                assert!(schema["properties"]["consistency_approved"].is_object());
            }
            ResponseFormat::Json { schema: None } => panic!("checker request {i} has no schema"),
            ResponseFormat::Text => assert!(!is_checker, "checker request {i} should ask for JSON"),
        }
    }

    // The retry carries the checker's feedback into the world builder's prompt
    let retry_prompt = task_prompt(&requests[4]);
    assert!(retry_prompt.contains("Original seed: A frozen northern kingdom"));
    assert!(retry_prompt.contains("Ice Caves has no way back to Stormkeep"));

    // The checker sees every earlier step as context
    let checker_prompt = task_prompt(&requests[7]);
    assert!(checker_prompt.contains("## build_world (World Builder)"));
    assert!(checker_prompt.contains("## create_npcs (Character Creator)"));
    assert!(checker_prompt.contains("## design_quests (Quest Designer)"));

    let saved: WorldState = store::load(&dir.path().join("world_state.json")).await.unwrap();
    assert_eq!(saved, world);
}

#[tokio::test]
async fn e2e_generation_gives_up_after_max_iterations() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(|request| {
        if system_prompt(request).starts_with("You are Consistency Checker") {
            text_response(&world_json(false).to_string())
        } else {
            text_response("draft")
        }
    });

    let err = WorldGenerator::new(executor(provider.clone()), dir.path())
        .with_max_iterations(2)
        .run("A frozen northern kingdom")
        .await
        .unwrap_err();

    match err {
        agentquest_core::GenerationError::Exhausted { attempts, .. } => assert_eq!(attempts.len(), 2),
        other => panic!("expected Exhausted, got {other:?}"),
    }
    assert_eq!(provider.requests().len(), 8);
    assert!(!dir.path().join("world_state.json").exists());
}

// ── E2E: Generate, then Play ─────────────────────────────────────────────

#[tokio::test]
async fn e2e_generate_then_play_until_game_over() {
    let dir = tempfile::tempdir().unwrap();
    let world_dir = dir.path().join("world");
    let session_dir = dir.path().join("session");

    let world = WorldGenerator::new(executor(ScriptedProvider::new(generation_script())), &world_dir)
        .run("A frozen northern kingdom")
        .await
        .unwrap();

    let players = parse_roster_toml(sample_roster_toml()).unwrap();
    let provider = ScriptedProvider::new(play_script(2));
    let options = SessionOptions {
        world_path: Some(world_dir.join("world_state.json")),
        ..SessionOptions::default()
    };
    let mut session = GameSession::open(world, players, &session_dir, executor(provider.clone()), options)
        .await
        .unwrap();

    assert!(session.run_round().await.unwrap());
    assert!(!session.run_round().await.unwrap());

    let state: GameState = store::load(&session_dir.join("game_state.json")).await.unwrap();
    assert_eq!(state.round_number, 3);
    assert_eq!(state.current_location, "Stormkeep");
    assert_eq!(state.session_history.len(), 2);
    assert!(state.session_history[0].ends_with("STATUS: CONTINUE"));
    assert!(state.session_history[1].ends_with("STATUS: GAME_OVER"));
    assert!(state.session_history[0].contains("Rolled 1d20+2"));

    let transcript = std::fs::read_to_string(session_dir.join("transcript.md")).unwrap();
    assert!(transcript.contains("## Round 1"));
    assert!(transcript.contains("## Round 2"));

    // Per round: scene (lookup + text), two players (sheet + text), resolve (roll + text)
    let requests = provider.requests();
    assert_eq!(requests.len(), 16);

    // The lookup tool read the generated world
    let scene = &requests[1];
    assert_eq!(tool_outputs(scene), vec!["A frozen northern kingdom"]);

    // The player's sheet came from the persisted game state
    let sheet = tool_outputs(&requests[3]);
    assert!(sheet[0].contains("\"hp\": 10"));

    // The second round's prompts carry the first round's resolution
    let round_two_scene = task_prompt(&requests[8]);
    assert!(round_two_scene.contains("Round: 2"));
    assert!(round_two_scene.contains("The gates creak open."));
}

#[tokio::test]
async fn e2e_session_resumes_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let world: WorldState = serde_json::from_value({
        let mut v = world_json(true);
        v["seed"] = "A frozen northern kingdom".into();
        v
    })
    .unwrap();
    let players = parse_roster_toml(sample_roster_toml()).unwrap();

    let mut first = GameSession::open(
        world.clone(),
        players.clone(),
        dir.path(),
        executor(ScriptedProvider::new(play_script(99))),
        SessionOptions::default(),
    )
    .await
    .unwrap();
    first.run_round().await.unwrap();
    drop(first);

    let resumed = GameSession::open(
        world.clone(),
        players.clone(),
        dir.path(),
        executor(ScriptedProvider::new(play_script(99))),
        SessionOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(resumed.game_state().round_number, 2);
    assert_eq!(resumed.game_state().session_history.len(), 1);

    let fresh = GameSession::open(
        world,
        players,
        dir.path(),
        executor(ScriptedProvider::new(play_script(99))),
        SessionOptions {
            resume: false,
            ..SessionOptions::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(fresh.game_state().round_number, 1);
    assert!(fresh.game_state().session_history.is_empty());
}

#[tokio::test]
async fn e2e_round_events_stream_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let world: WorldState = serde_json::from_value({
        let mut v = world_json(true);
        v["seed"] = "A frozen northern kingdom".into();
        v
    })
    .unwrap();
    let players = parse_roster_toml(sample_roster_toml()).unwrap();
    let mut session = GameSession::open(
        world,
        players,
        dir.path(),
        executor(ScriptedProvider::new(play_script(1))),
        SessionOptions::default(),
    )
    .await
    .unwrap();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let report = session.run_round_with_events(&tx).await.unwrap();
    drop(tx);
    assert_eq!(report.outcome, RoundOutcome::GameOver);
    assert!(!report.compacted);

    let mut kinds = Vec::new();
    while let Some(event) = rx.recv().await {
        kinds.push(event.event_type());
        if let RoundEvent::RoundCommitted { game_state, .. } = &event {
            assert_eq!(game_state.round_number, 2);
        }
    }
    assert_eq!(kinds.first(), Some(&"round_started"));
    assert_eq!(kinds.last(), Some(&"round_committed"));
    // scene, two players, resolve
    assert_eq!(kinds.iter().filter(|k| **k == "step_completed").count(), 4);
}
