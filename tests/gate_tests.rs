//! Tests for the per-request authorization gate pipeline.

use std::sync::Arc;

use chrono::{Duration, Utc};
use shiftgate_core::{
    init, Core, CoreConfig, Error, JwtConfig, MemoryShiftStore, MemoryUserStore, PasswordConfig,
    RegisterRequest, SystemClock, UserRole,
};

fn config(shift_enforcement: bool) -> CoreConfig {
    CoreConfig {
        jwt: JwtConfig {
            access_secret: "access-secret-0123456789abcdef0123456789".to_string(),
            refresh_secret: "refresh-secret-0123456789abcdef012345678".to_string(),
            ..JwtConfig::default()
        },
        password: PasswordConfig { bcrypt_cost: 4 },
        shift_enforcement,
    }
}

fn gated_core(shift_enforcement: bool) -> Core {
    init(
        config(shift_enforcement),
        Arc::new(MemoryUserStore::new()),
        Arc::new(MemoryShiftStore::new()),
        Arc::new(SystemClock),
    )
    .expect("failed to wire test core")
}

fn operator(email: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: "a perfectly fine password".to_string(),
        full_name: "Gate Test".to_string(),
        role: UserRole::Operator,
        phone: None,
        company_id: "ACME01".to_string(),
    }
}

async fn login_token(core: &Core, email: &str, device: Option<&str>) -> String {
    core.auth
        .login(email, "a perfectly fine password", device)
        .await
        .unwrap()
        .tokens
        .access_token
}

#[tokio::test]
async fn test_allow_produces_normalized_context() {
    let core = gated_core(false);
    let registered = core.auth.register(operator("op@example.com")).await.unwrap();

    let token = login_token(&core, "op@example.com", Some("tablet-7")).await;
    let ctx = core.gate.authorize(&token, &[]).await.unwrap();

    assert_eq!(ctx.sub, registered.user.id);
    assert_eq!(ctx.email, "op@example.com");
    assert_eq!(ctx.role, UserRole::Operator);
    assert_eq!(ctx.company_id, "ACME01");
    assert_eq!(ctx.device_id.as_deref(), Some("tablet-7"));
}

#[tokio::test]
async fn test_foreign_and_corrupt_tokens_rejected() {
    let core = gated_core(false);
    core.auth.register(operator("op@example.com")).await.unwrap();
    login_token(&core, "op@example.com", None).await;

    // Token minted by an unrelated deployment (different secrets).
    let mut foreign_config = config(false);
    foreign_config.jwt.access_secret = "another-access-secret-9876543210fedcba98".to_string();
    foreign_config.jwt.refresh_secret = "another-refresh-secret-9876543210fedcba9".to_string();
    let foreign = init(
        foreign_config,
        Arc::new(MemoryUserStore::new()),
        Arc::new(MemoryShiftStore::new()),
        Arc::new(SystemClock),
    )
    .unwrap();
    foreign.auth.register(operator("op@example.com")).await.unwrap();
    let foreign_token = login_token(&foreign, "op@example.com", None).await;

    assert!(matches!(
        core.gate.authorize(&foreign_token, &[]).await,
        Err(Error::Unauthorized)
    ));
    assert!(matches!(
        core.gate.authorize("garbage.token.here", &[]).await,
        Err(Error::Unauthorized)
    ));
}

#[tokio::test]
async fn test_role_check() {
    let core = gated_core(false);
    core.auth.register(operator("op@example.com")).await.unwrap();
    let token = login_token(&core, "op@example.com", None).await;

    // Empty required set means no restriction.
    core.gate.authorize(&token, &[]).await.unwrap();

    // Membership passes.
    core.gate
        .authorize(&token, &[UserRole::Operator, UserRole::Supervisor])
        .await
        .unwrap();

    // Non-membership is Forbidden, not Unauthorized.
    assert!(matches!(
        core.gate.authorize(&token, &[UserRole::Admin]).await,
        Err(Error::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_stale_device_token_rejected_after_eviction() {
    let core = gated_core(false);
    core.auth.register(operator("op@example.com")).await.unwrap();

    let token_a = login_token(&core, "op@example.com", Some("device-a")).await;
    core.gate.authorize(&token_a, &[]).await.unwrap();

    // Concurrent login from device B: A's token still has a valid
    // signature but fails the session freshness check.
    login_token(&core, "op@example.com", Some("device-b")).await;
    assert!(matches!(
        core.gate.authorize(&token_a, &[]).await,
        Err(Error::Unauthorized)
    ));
}

#[tokio::test]
async fn test_shift_enforcement_blocks_outside_window() {
    let core = gated_core(true);
    let registered = core.auth.register(operator("op@example.com")).await.unwrap();
    let user_id = registered.user.id.clone();

    // An exception window wholly in the past: the user has active records,
    // none matching now.
    core.shifts
        .create_exception(
            &user_id,
            Utc::now() - Duration::hours(3),
            Utc::now() - Duration::hours(1),
            "supervisor-1".to_string(),
            None,
        )
        .await
        .unwrap();

    // Login is blocked too: Forbidden, not Unauthorized.
    assert!(matches!(
        core.auth
            .login("op@example.com", "a perfectly fine password", None)
            .await,
        Err(Error::Forbidden(_))
    ));

    // Widen the schedule with a currently-open exception and log in.
    core.shifts
        .create_exception(
            &user_id,
            Utc::now() - Duration::hours(1),
            Utc::now() + Duration::hours(1),
            "supervisor-1".to_string(),
            None,
        )
        .await
        .unwrap();
    let token = login_token(&core, "op@example.com", None).await;
    core.gate.authorize(&token, &[]).await.unwrap();
}

#[tokio::test]
async fn test_unscheduled_user_passes_enforcement() {
    // Default-open: zero shift records means no restriction even with
    // enforcement switched on.
    let core = gated_core(true);
    core.auth.register(operator("op@example.com")).await.unwrap();
    let token = login_token(&core, "op@example.com", None).await;
    core.gate.authorize(&token, &[]).await.unwrap();
}

#[tokio::test]
async fn test_enforcement_off_ignores_schedule() {
    let core = gated_core(false);
    let registered = core.auth.register(operator("op@example.com")).await.unwrap();

    // Active record that never matches: with enforcement off it is ignored.
    core.shifts
        .create_exception(
            &registered.user.id,
            Utc::now() - Duration::hours(3),
            Utc::now() - Duration::hours(1),
            "supervisor-1".to_string(),
            None,
        )
        .await
        .unwrap();

    let token = login_token(&core, "op@example.com", None).await;
    core.gate.authorize(&token, &[]).await.unwrap();
}
