use super::*;

use studyfeed::{
    Attachment, BlobStore, DateTime, IdentityProvider, PostBuilder, PostStore,
    ProfileEvent, ProfileUpdate, SessionToken, StoreError, User,
};

#[tokio::test]
async fn config_serialization() {
    tracing_subscriber::fmt::try_init().ok();

    // Individual types.
    let sc = ServeConfig::default();
    let sc_toml = toml::to_string_pretty(&sc).unwrap();
    let _sc: ServeConfig = toml::from_str(&sc_toml).unwrap();

    let config = Config::default();
    let config_toml = toml::to_string_pretty(&config).unwrap();
    let _config: Config = toml::from_str(&config_toml).unwrap();

    // An empty file is a valid config.
    let config: Config = toml::from_str("").unwrap();
    assert!(config.database.is_none());
    assert_eq!(config.feed_limit(), DEFAULT_STORAGE as usize);

    // Full config, humantime cache duration included.
    let config: Config = toml::from_str(
        r#"
        log = "~/.local/share/studystream/log"
        database = "~/.local/share/studystream/db.sqlite"
        files = "~/.local/share/studystream/files"
        storage = 256

        [serve]
        port = 4000
        cache = "2m"
        "#,
    )
    .unwrap();
    assert_eq!(config.feed_limit(), 256);
    assert_eq!(config.serve.port, Some(4000));
    assert_eq!(
        config.serve.cache,
        Some(std::time::Duration::from_secs(120))
    );
}

#[tokio::test]
async fn account_validation() {
    tracing_subscriber::fmt::try_init().ok();
    let db = Database::new(":memory:").await.unwrap();

    assert!(matches!(
        db.sign_up("not-an-email", "Ada", "longenough").await,
        Err(StoreError::Invalid(_))
    ));
    assert!(matches!(
        db.sign_up("ada@example.com", "", "longenough").await,
        Err(StoreError::Invalid(_))
    ));
    assert!(matches!(
        db.sign_up("ada@example.com", "Ada", "short").await,
        Err(StoreError::Invalid(_))
    ));

    db.sign_up("ada@example.com", "Ada", "longenough")
        .await
        .unwrap();
    assert!(matches!(
        db.sign_up("ada@example.com", "Other Ada", "longenough").await,
        Err(StoreError::AccountExists)
    ));
}

#[tokio::test]
async fn identity_flow() {
    tracing_subscriber::fmt::try_init().ok();
    let db = Database::new(":memory:").await.unwrap();
    let mut events = db.subscribe();

    let created = db
        .sign_up("ada@example.com", "Ada", "longenough")
        .await
        .unwrap();
    assert_eq!(created.display_name, "Ada");
    assert_eq!(created.avatar, "/default-avatar.png");

    // Wrong password does not sign in.
    assert!(matches!(
        db.sign_in("ada@example.com", "wrongpassword").await,
        Err(StoreError::Unauthorized)
    ));
    assert!(matches!(
        db.sign_in("nobody@example.com", "longenough").await,
        Err(StoreError::Unauthorized)
    ));

    let (user, token) =
        db.sign_in("ada@example.com", "longenough").await.unwrap();
    assert_eq!(user.id, created.id);
    let resolved = db.user_for_token(&token).await.unwrap().unwrap();
    assert_eq!(resolved, user);

    // Profile update is observable via the token and the event stream.
    let updated = db
        .update_profile(
            &user.id,
            &ProfileUpdate {
                display_name: Some("Ada L.".into()),
                avatar: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.display_name, "Ada L.");
    assert_eq!(updated.avatar, "/default-avatar.png");
    match events.recv().await.unwrap() {
        ProfileEvent::Updated(event_user) => {
            assert_eq!(event_user, updated);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    // Signing out the last session kills the token and announces it.
    db.sign_out(&token).await.unwrap();
    assert!(db.user_for_token(&token).await.unwrap().is_none());
    match events.recv().await.unwrap() {
        ProfileEvent::SignedOut(user_id) => assert_eq!(user_id, user.id),
        other => panic!("unexpected event: {:?}", other),
    }

    // Unknown tokens sign out quietly.
    db.sign_out(&SessionToken::new("no-such-token"))
        .await
        .unwrap();
}

#[tokio::test]
async fn sign_out_keeps_other_sessions() {
    tracing_subscriber::fmt::try_init().ok();
    let db = Database::new(":memory:").await.unwrap();
    let mut events = db.subscribe();

    db.sign_up("ada@example.com", "Ada", "longenough")
        .await
        .unwrap();
    let (_, first) =
        db.sign_in("ada@example.com", "longenough").await.unwrap();
    let (_, second) =
        db.sign_in("ada@example.com", "longenough").await.unwrap();

    db.sign_out(&first).await.unwrap();
    assert!(db.user_for_token(&first).await.unwrap().is_none());
    assert!(db.user_for_token(&second).await.unwrap().is_some());
    // No sign-out event while a session survives.
    assert!(events.try_recv().is_err());
}

/// Build a post for store tests.
fn post(id: &str, title: &str, created: &str) -> studyfeed::Post {
    let mut builder = PostBuilder::new();
    builder
        .id(id)
        .title(title)
        .description("desc")
        .author("Ada")
        .author_id("author-1")
        .avatar("/default-avatar.png")
        .subject(studyfeed::Subject::Physics)
        .kind(studyfeed::PostKind::Note)
        .created(DateTime::try_from(created).unwrap());
    builder.build()
}

#[tokio::test]
async fn post_roundtrip() {
    tracing_subscriber::fmt::try_init().ok();
    let db = Database::new(":memory:").await.unwrap();

    let mut builder = PostBuilder::new();
    builder
        .id("post-1")
        .title("Wave mechanics study guide")
        .description("Everything up to the midterm.")
        .author("Ada")
        .author_id("author-1")
        .avatar("/avatars/ada.png")
        .subject(studyfeed::Subject::Physics)
        .kind(studyfeed::PostKind::StudyGuide)
        .created(DateTime::try_from("2024-03-01T10:00:00Z").unwrap())
        .due(DateTime::try_from("2024-03-15").unwrap())
        .attachment(Attachment::new_with_mime(
            "/files/a_waves.pdf",
            "waves.pdf",
            "application/pdf",
        ))
        .attachment(Attachment::new("/files/b_notes.txt", "notes.txt"));
    let original = builder.build();
    db.create_post(&original).await.unwrap();

    let fetched = db
        .post(&studyfeed::PostId::new("post-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.title(), original.title());
    assert_eq!(fetched.subject(), original.subject());
    assert_eq!(fetched.kind(), original.kind());
    assert_eq!(fetched.created(), original.created());
    assert_eq!(fetched.due(), original.due());
    // Attachments come back in upload order.
    assert_eq!(fetched.attachments(), original.attachments());

    assert!(db
        .post(&studyfeed::PostId::new("no-such-post"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn recent_posts_are_newest_first() {
    tracing_subscriber::fmt::try_init().ok();
    let db = Database::new(":memory:").await.unwrap();

    db.create_post(&post("a", "oldest", "2024-01-01T00:00:00Z"))
        .await
        .unwrap();
    db.create_post(&post("b", "newest", "2024-03-01T00:00:00Z"))
        .await
        .unwrap();
    db.create_post(&post("c", "middle", "2024-02-01T00:00:00Z"))
        .await
        .unwrap();

    let set = db.recent_posts(16).await.unwrap();
    let titles: Vec<&String> =
        set.as_slice().iter().map(|post| post.title()).collect();
    assert_eq!(titles, vec!["newest", "middle", "oldest"]);

    // The limit keeps only the newest posts.
    let set = db.recent_posts(2).await.unwrap();
    let titles: Vec<&String> =
        set.as_slice().iter().map(|post| post.title()).collect();
    assert_eq!(titles, vec!["newest", "middle"]);
}

#[tokio::test]
async fn posts_by_author_lists_only_own_posts() {
    tracing_subscriber::fmt::try_init().ok();
    let db = Database::new(":memory:").await.unwrap();

    let by = |id: &str, title: &str, author_id: &str, created: &str| {
        let mut builder = PostBuilder::new();
        builder
            .id(id)
            .title(title)
            .author_id(author_id)
            .subject(studyfeed::Subject::History)
            .kind(studyfeed::PostKind::Note)
            .created(DateTime::try_from(created).unwrap());
        builder.build()
    };
    db.create_post(&by("a", "mine, older", "ada", "2024-01-01T00:00:00Z"))
        .await
        .unwrap();
    db.create_post(&by("b", "theirs", "grace", "2024-02-01T00:00:00Z"))
        .await
        .unwrap();
    db.create_post(&by("c", "mine, newer", "ada", "2024-03-01T00:00:00Z"))
        .await
        .unwrap();

    let set = db.posts_by_author("ada", 16).await.unwrap();
    let titles: Vec<&String> =
        set.as_slice().iter().map(|post| post.title()).collect();
    assert_eq!(titles, vec!["mine, newer", "mine, older"]);
    assert!(set.as_slice().iter().all(|post| post.is_by("ada")));

    assert!(db.posts_by_author("nobody", 16).await.unwrap().is_empty());
}

#[tokio::test]
async fn recent_posts_filter_end_to_end() {
    tracing_subscriber::fmt::try_init().ok();
    let db = Database::new(":memory:").await.unwrap();

    db.create_post(&post("a", "Wave notes", "2024-01-01T00:00:00Z"))
        .await
        .unwrap();
    db.create_post(&post("b", "Optics homework", "2024-02-01T00:00:00Z"))
        .await
        .unwrap();

    let set = db.recent_posts(16).await.unwrap();
    let criteria = studyfeed::FilterCriteria {
        subject: Some(studyfeed::Subject::Physics),
        kind: None,
        query: "wave".into(),
    };
    let matched: Vec<&studyfeed::Post> = set.filtered(&criteria).collect();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].title(), "Wave notes");
}

fn user(id: &str, display_name: &str) -> User {
    User {
        id: id.into(),
        display_name: display_name.into(),
        email: format!("{}@example.com", id),
        avatar: "/default-avatar.png".into(),
    }
}

#[tokio::test]
async fn session_registry() {
    tracing_subscriber::fmt::try_init().ok();
    let sessions = Sessions::new();

    sessions
        .insert(SessionToken::new("t1"), user("u1", "Ada"))
        .await;
    sessions
        .insert(SessionToken::new("t2"), user("u1", "Ada"))
        .await;
    sessions
        .insert(SessionToken::new("t3"), user("u2", "Grace"))
        .await;
    assert_eq!(sessions.len().await, 3);

    // Profile updates reach every session of that user.
    sessions
        .handle_event(ProfileEvent::Updated(user("u1", "Ada L.")))
        .await;
    let db = Database::new(":memory:").await.unwrap();
    let resolved = sessions
        .resolve(&SessionToken::new("t2"), &db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.display_name, "Ada L.");

    // A full sign-out clears that user's sessions and nothing else.
    sessions
        .handle_event(ProfileEvent::SignedOut("u1".into()))
        .await;
    assert_eq!(sessions.len().await, 1);
    assert!(sessions
        .resolve(&SessionToken::new("t3"), &db)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn session_registry_falls_back_to_identity_provider() {
    tracing_subscriber::fmt::try_init().ok();
    let db = Database::new(":memory:").await.unwrap();
    let sessions = Sessions::new();

    db.sign_up("ada@example.com", "Ada", "longenough")
        .await
        .unwrap();
    let (user, token) =
        db.sign_in("ada@example.com", "longenough").await.unwrap();

    // Nothing cached yet; resolution goes through the database.
    assert_eq!(sessions.len().await, 0);
    let resolved = sessions.resolve(&token, &db).await.unwrap().unwrap();
    assert_eq!(resolved, user);
    assert_eq!(sessions.len().await, 1);

    assert!(sessions
        .resolve(&SessionToken::new("no-such-token"), &db)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn blob_store_roundtrip() {
    tracing_subscriber::fmt::try_init().ok();
    let root = std::env::temp_dir()
        .join(format!("studystream-test-{}", uuid::Uuid::new_v4()));
    let blobs = FsBlobs::new(root.to_string_lossy()).unwrap();

    let url = blobs
        .store("waves.pdf", b"pdf bytes".to_vec())
        .await
        .unwrap();
    assert!(url.starts_with("/files/"));
    assert!(url.ends_with("_waves.pdf"));

    let stored = url.strip_prefix("/files/").unwrap();
    assert_eq!(blobs.read(stored).await.unwrap(), b"pdf bytes");

    // Uploaded names are stripped to a safe basename.
    let url = blobs
        .store("../../etc/pass wd", b"x".to_vec())
        .await
        .unwrap();
    assert!(url.ends_with("_pass_wd"));

    std::fs::remove_dir_all(&root).ok();
}

#[tokio::test]
async fn blob_store_rejects_path_lookups() {
    tracing_subscriber::fmt::try_init().ok();
    let root = std::env::temp_dir()
        .join(format!("studystream-test-{}", uuid::Uuid::new_v4()));
    let blobs = FsBlobs::new(root.to_string_lossy()).unwrap();

    assert!(matches!(
        blobs.read("../secrets").await,
        Err(StoreError::NotFound)
    ));
    assert!(matches!(
        blobs.read("a/b").await,
        Err(StoreError::NotFound)
    ));
    assert!(matches!(
        blobs.read("missing.txt").await,
        Err(StoreError::NotFound)
    ));

    std::fs::remove_dir_all(&root).ok();
}
