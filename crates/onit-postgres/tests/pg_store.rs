//! Store and session lifecycle tests against a live database.
//!
//! Every test is skipped unless `POSTGRES_URL` is set, either in the
//! environment or in a `.env` file.

use std::sync::Arc;

use onit_core::prelude::*;
use onit_postgres::{PgClient, PgClientMigrationExt, PgConfig};
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Migrations run once per test binary; the tests themselves run in parallel.
static MIGRATED: OnceCell<()> = OnceCell::const_new();

async fn client() -> anyhow::Result<Option<PgClient>> {
    let _ = dotenvy::dotenv();
    let Ok(url) = std::env::var("POSTGRES_URL") else {
        eprintln!("POSTGRES_URL is not set, skipping");
        return Ok(None);
    };

    let client = PgConfig::new(url).build()?;
    MIGRATED
        .get_or_try_init(|| async {
            client.run_pending_migrations().await?;
            anyhow::Ok(())
        })
        .await?;

    Ok(Some(client))
}

fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::now_v7().simple())
}

fn service(client: PgClient) -> anyhow::Result<AuthService<PgClient>> {
    let config = AuthConfig::new("http://localhost", "test-secret").with_password_pepper("pepper");
    Ok(AuthService::new(&config, client)?)
}

#[tokio::test]
async fn migrations_are_idempotent() -> anyhow::Result<()> {
    let Some(client) = client().await? else {
        return Ok(());
    };

    let result = client.run_pending_migrations().await?;
    assert!(result.is_no_op());

    let status = client.migration_status().await?;
    assert!(status.is_up_to_date());
    assert!(status.current_version().is_some());

    client.verify_schema_integrity().await?;
    Ok(())
}

#[tokio::test]
async fn account_round_trip() -> anyhow::Result<()> {
    let Some(client) = client().await? else {
        return Ok(());
    };
    let ctx = RequestContext::new();

    let name = unique_name("alice");
    let user = User::new(&name, "alice@example.com");
    let password = PasswordHasher::new("pepper").hash_password(&Credentials::new(&name, "p@ss"))?;
    client.insert_account(&ctx, &user, &password).await?;

    let found = client.find_user_by_name(&ctx, &name).await?;
    assert_eq!(found, user);
    assert_eq!(client.find_user_by_id(&ctx, user.id).await?, user);
    assert_eq!(client.find_password_by_username(&ctx, &name).await?, password);
    Ok(())
}

#[tokio::test]
async fn duplicate_accounts_are_rejected_atomically() -> anyhow::Result<()> {
    let Some(client) = client().await? else {
        return Ok(());
    };
    let ctx = RequestContext::new();
    let hasher = PasswordHasher::new("pepper");

    let name = unique_name("bob");
    let first = User::new(&name, "bob@example.com");
    client
        .insert_account(&ctx, &first, &hasher.hash_password(&Credentials::new(&name, "one"))?)
        .await?;

    let second = User::new(&name, "other@example.com");
    let error = client
        .insert_account(&ctx, &second, &hasher.hash_password(&Credentials::new(&name, "two"))?)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::BadRequest);
    assert_eq!(error.message(), "failed to create user: user already exists");

    let error = client.find_user_by_id(&ctx, second.id).await.unwrap_err();
    assert_eq!(error.message(), "cannot find user");
    Ok(())
}

#[tokio::test]
async fn missing_records_are_not_found() -> anyhow::Result<()> {
    let Some(client) = client().await? else {
        return Ok(());
    };
    let ctx = RequestContext::new();

    let error = client.find_user_by_name(&ctx, &unique_name("nobody")).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
    assert_eq!(error.message(), "cannot find user");

    let error = client
        .find_password_by_username(&ctx, &unique_name("nobody"))
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
    assert_eq!(error.message(), "must register first");

    let error = client
        .update_password(&ctx, &unique_name("nobody"), b"salt", b"hash")
        .await
        .unwrap_err();
    assert_eq!(error.message(), "must register first");

    assert!(!client.check_refresh_token(&ctx, Uuid::now_v7()).await?);
    Ok(())
}

#[tokio::test]
async fn sessions_keep_insertion_order() -> anyhow::Result<()> {
    let Some(client) = client().await? else {
        return Ok(());
    };
    let ctx = RequestContext::new();

    let name = unique_name("carol");
    let user = User::new(&name, "carol@example.com");
    client.insert_user(&ctx, &user).await?;

    let sessions: Vec<Uuid> = (0..3).map(|_| Uuid::now_v7()).collect();
    for session_id in &sessions {
        client.add_session(&ctx, user.id, *session_id).await?;
    }
    let user_with_sessions = client.add_session(&ctx, user.id, sessions[0]).await?;
    assert_eq!(user_with_sessions.sessions, sessions);

    let updated = client.remove_session(&ctx, user.id, sessions[1]).await?;
    assert_eq!(updated.sessions, vec![sessions[0], sessions[2]]);

    client.clear_sessions(&ctx, user.id).await?;
    assert!(client.find_user_by_id(&ctx, user.id).await?.sessions.is_empty());

    let error = client
        .add_session(&ctx, Uuid::now_v7(), Uuid::now_v7())
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
    Ok(())
}

#[tokio::test]
async fn password_update_replaces_hash() -> anyhow::Result<()> {
    let Some(client) = client().await? else {
        return Ok(());
    };
    let ctx = RequestContext::new();
    let hasher = PasswordHasher::new("pepper");

    let name = unique_name("dave");
    let user = User::new(&name, "dave@example.com");
    let password = hasher.hash_password(&Credentials::new(&name, "old"))?;
    client.insert_account(&ctx, &user, &password).await?;

    let changed = hasher.hash_password(&Credentials::new(&name, "new"))?;
    client
        .update_password(&ctx, &name, &changed.salt, &changed.hashed_password)
        .await?;

    let stored = client.find_password_by_username(&ctx, &name).await?;
    assert_eq!(stored.id, password.id);
    hasher.verify(&stored, "new")?;
    assert!(hasher.verify(&stored, "old").is_err());
    Ok(())
}

#[tokio::test]
async fn concurrent_consumption_has_one_winner() -> anyhow::Result<()> {
    let Some(client) = client().await? else {
        return Ok(());
    };
    let ctx = RequestContext::new();

    let access = AccessToken::new(
        Uuid::now_v7(),
        Uuid::now_v7(),
        "http://localhost",
        jiff::Timestamp::now(),
        jiff::SignedDuration::from_secs(300),
    );
    let token = RefreshToken::new(&access, jiff::SignedDuration::from_hours(24));
    let session_id = token.session_id;
    client.insert_refresh_token(&ctx, &token).await?;
    assert!(client.check_refresh_token(&ctx, session_id).await?);

    let error = client.insert_refresh_token(&ctx, &token).await.unwrap_err();
    assert_eq!(error.message(), "failed to create session: session already exists");

    let client = Arc::new(client);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move {
            client
                .consume_refresh_token(&RequestContext::new(), session_id)
                .await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await? {
            Ok(()) => winners += 1,
            Err(error) => assert_eq!(error.message(), "session has expired"),
        }
    }
    assert_eq!(winners, 1);
    assert!(!client.check_refresh_token(&ctx, session_id).await?);

    assert_eq!(client.delete_refresh_tokens_by_user(&ctx, token.user_id).await?, 1);
    Ok(())
}

#[tokio::test]
async fn session_lifecycle() -> anyhow::Result<()> {
    let Some(client) = client().await? else {
        return Ok(());
    };
    let service = service(client)?;
    let ctx = RequestContext::new();

    let name = unique_name("erin");
    let registration = Registration::new(&name, "p@ss", "erin@example.com");
    let user = service.create_user(&ctx, &registration).await?;

    let session = service.login(&ctx, &Credentials::new(&name, "p@ss")).await?;
    assert_eq!(session.user.sessions, vec![session.tokens.session_id()]);

    let rotated = service
        .refresh_access(&ctx, &session.tokens.refresh)
        .await?;
    assert_eq!(rotated.user.sessions, vec![rotated.tokens.session_id()]);

    let error = service
        .refresh_access(&ctx, &session.tokens.refresh)
        .await
        .unwrap_err();
    assert_eq!(error.message(), "session has expired");

    service.logout(&ctx, Some(user.id)).await?;
    let error = service
        .refresh_access(&ctx, &rotated.tokens.refresh)
        .await
        .unwrap_err();
    assert_eq!(error.message(), "session has expired");
    Ok(())
}
