//! JSON front end for the bracket engine: one endpoint per tournament command.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! TOURNEY_ADMINS (comma separated ids) grants the admin role in every community.

use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use serde::Deserialize;
use std::sync::Arc;
use tourney_bracket::config::ServerConfig;
use tourney_bracket::{
    CommunityId, EntrantId, LogMessenger, Member, MemoryLedger, Permissions, Role,
    RolePermissions, TeamId, TournamentError, TournamentMetadata, TournamentMode,
    TournamentStore,
};

struct AppState {
    store: TournamentStore,
    ledger: Arc<MemoryLedger>,
    roles: Arc<RolePermissions>,
}

type State = Data<AppState>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct ConfigureBody {
    mode: TournamentMode,
    capacity: usize,
    #[serde(flatten)]
    metadata: TournamentMetadata,
}

#[derive(Deserialize)]
struct MemberBody {
    id: EntrantId,
    name: String,
}

impl From<MemberBody> for Member {
    fn from(b: MemberBody) -> Self {
        Member::new(b.id, b.name.trim())
    }
}

#[derive(Deserialize)]
struct ActorBody {
    actor: EntrantId,
}

#[derive(Deserialize)]
struct WinnerBody {
    actor: EntrantId,
    /// Any member of the winning side.
    entrant: EntrantId,
}

#[derive(Deserialize)]
struct TeamBody {
    first: MemberBody,
    second: MemberBody,
}

#[derive(Deserialize)]
struct LeaveTeamBody {
    entrant: EntrantId,
}

#[derive(Deserialize)]
struct GrantRoleBody {
    actor: EntrantId,
    target: EntrantId,
    role: Role,
}

/// Path segment: community id (e.g. /api/communities/{id})
#[derive(Deserialize)]
struct CommunityPath {
    id: CommunityId,
}

/// Path segments: community id and entrant id.
#[derive(Deserialize)]
struct CommunityEntrantPath {
    id: CommunityId,
    entrant_id: EntrantId,
}

/// Path segments: community id and team id.
#[derive(Deserialize)]
struct CommunityTeamPath {
    id: CommunityId,
    team_id: TeamId,
}

fn error_response(e: TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentError::Forbidden => HttpResponse::Forbidden().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "tourney-bracket",
    })
}

/// Configure a fresh tournament for the community (opens registration).
#[post("/api/communities/{id}/tournament")]
async fn api_configure(state: State, path: Path<CommunityPath>, body: Json<ConfigureBody>) -> HttpResponse {
    let body = body.into_inner();
    match state
        .store
        .configure(path.id, body.mode, body.capacity, body.metadata)
    {
        Ok(t) => HttpResponse::Ok().json(t),
        Err(e) => error_response(e),
    }
}

/// Current tournament snapshot (bracket, entrants, phase).
#[get("/api/communities/{id}/tournament")]
async fn api_get_tournament(state: State, path: Path<CommunityPath>) -> HttpResponse {
    HttpResponse::Ok().json(state.store.snapshot(path.id))
}

/// Discard the community's tournament, whatever its phase.
#[post("/api/communities/{id}/tournament/reset")]
async fn api_reset(state: State, path: Path<CommunityPath>, body: Json<ActorBody>) -> HttpResponse {
    if !state.roles.can_start(body.actor, path.id) {
        return error_response(TournamentError::Forbidden);
    }
    let id = state.store.reset(path.id, body.actor);
    HttpResponse::Ok().json(serde_json::json!({ "tournament": id }))
}

/// Register a member (their whole team in 2v2).
#[post("/api/communities/{id}/registrations")]
async fn api_register(state: State, path: Path<CommunityPath>, body: Json<MemberBody>) -> HttpResponse {
    match state.store.register(path.id, body.into_inner().into()) {
        Ok(fill) => HttpResponse::Ok().json(fill),
        Err(e) => error_response(e),
    }
}

/// Withdraw a member (their whole team in 2v2).
#[delete("/api/communities/{id}/registrations/{entrant_id}")]
async fn api_unregister(state: State, path: Path<CommunityEntrantPath>) -> HttpResponse {
    match state.store.unregister(path.id, path.entrant_id) {
        Ok(fill) => HttpResponse::Ok().json(fill),
        Err(e) => error_response(e),
    }
}

/// Start the tournament: bye-fill, shuffle, round 1.
#[post("/api/communities/{id}/start")]
async fn api_start(state: State, path: Path<CommunityPath>, body: Json<ActorBody>) -> HttpResponse {
    match state.store.start(path.id, body.actor) {
        Ok(round) => HttpResponse::Ok().json(round),
        Err(e) => error_response(e),
    }
}

/// Record the winner of a match in the current round.
#[post("/api/communities/{id}/winner")]
async fn api_winner(state: State, path: Path<CommunityPath>, body: Json<WinnerBody>) -> HttpResponse {
    match state.store.record_winner(path.id, body.actor, body.entrant) {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => error_response(e),
    }
}

#[post("/api/communities/{id}/teams")]
async fn api_create_team(state: State, path: Path<CommunityPath>, body: Json<TeamBody>) -> HttpResponse {
    let TeamBody { first, second } = body.into_inner();
    match state.store.register_team(path.id, first.into(), second.into()) {
        Ok(team_id) => HttpResponse::Ok().json(serde_json::json!({ "team": team_id })),
        Err(e) => error_response(e),
    }
}

#[delete("/api/communities/{id}/teams/{team_id}")]
async fn api_dissolve_team(state: State, path: Path<CommunityTeamPath>) -> HttpResponse {
    match state.store.dissolve_team(path.id, path.team_id) {
        Ok(team) => HttpResponse::Ok().json(team),
        Err(e) => error_response(e),
    }
}

#[post("/api/communities/{id}/teams/leave")]
async fn api_leave_team(state: State, path: Path<CommunityPath>, body: Json<LeaveTeamBody>) -> HttpResponse {
    match state.store.leave_team(path.id, body.entrant) {
        Ok(team) => HttpResponse::Ok().json(team),
        Err(e) => error_response(e),
    }
}

#[get("/api/communities/{id}/members/{entrant_id}/team")]
async fn api_team_of(state: State, path: Path<CommunityEntrantPath>) -> HttpResponse {
    match state.store.team_of(path.id, path.entrant_id) {
        Some(team) => HttpResponse::Ok().json(team),
        None => error_response(TournamentError::NotTeamed),
    }
}

/// Seasonal points of a member.
#[get("/api/communities/{id}/members/{entrant_id}/points")]
async fn api_points(state: State, path: Path<CommunityEntrantPath>) -> HttpResponse {
    let points = state.ledger.balance(path.id, path.entrant_id);
    HttpResponse::Ok().json(serde_json::json!({ "entrant": path.entrant_id, "points": points }))
}

/// Grant a staff role (community admins only).
#[put("/api/communities/{id}/roles")]
async fn api_grant_role(state: State, path: Path<CommunityPath>, body: Json<GrantRoleBody>) -> HttpResponse {
    if !state.roles.is_admin(body.actor, path.id) {
        return error_response(TournamentError::Forbidden);
    }
    state.roles.grant(path.id, body.target, body.role);
    log::info!(
        "community {}: actor {} granted {:?} to {}",
        path.id,
        body.actor,
        body.role,
        body.target
    );
    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    log::info!("Starting server at http://{}:{}", config.host, config.port);

    let ledger = Arc::new(MemoryLedger::new());
    let roles = Arc::new(RolePermissions::new(config.admins.iter().copied()));
    let store = TournamentStore::new(Arc::new(LogMessenger), ledger.clone(), roles.clone());
    let state = Data::new(AppState {
        store,
        ledger,
        roles,
    });

    // Background task: drop idle communities that have no running bracket
    let state_cleanup = state.clone();
    let (idle_timeout, prune_interval) = (config.idle_timeout, config.prune_interval);
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(prune_interval);
        loop {
            interval.tick().await;
            let removed = state_cleanup.store.prune_idle(idle_timeout);
            if removed > 0 {
                log::info!("Cleaned up {} idle community state(s)", removed);
            }
        }
    });

    let bind = (config.host.clone(), config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_configure)
            .service(api_get_tournament)
            .service(api_reset)
            .service(api_register)
            .service(api_unregister)
            .service(api_start)
            .service(api_winner)
            .service(api_create_team)
            .service(api_dissolve_team)
            .service(api_leave_team)
            .service(api_team_of)
            .service(api_points)
            .service(api_grant_role)
    })
    .bind(bind)?
    .run()
    .await
}
