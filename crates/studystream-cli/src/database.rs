//! Studystream database.
//!
//! Sqlite implementation of the identity provider and the post
//! document store. Profile changes fan out over a broadcast channel
//! so session holders can refresh.

use super::*;

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};
use sqlx::{
    Row, SqlitePool, sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions,
    sqlite::SqliteRow,
};
use tokio::sync::broadcast;

use studyfeed::{
    Attachment, DateTime, Post, PostBuilder, PostId, PostKind, PostSet,
    ProfileEvent, ProfileUpdate, SessionToken, StoreError, Subject, User,
};

/// Studystream database abstraction.
pub struct Database {
    /// Path to the sqlite database file.
    /// This is ":memory:" if the database is unspecified.
    #[allow(unused)]
    path: String,
    /// Connection to the sqlite database.
    pool: SqlitePool,
    /// Profile-change events for session refresh.
    events: broadcast::Sender<ProfileEvent>,
}

impl Database {
    /// Create a new database.
    pub async fn new(path: impl AsRef<str>) -> Result<Self> {
        // Parse path and create parents if necessary. Additionally set connect
        // options according to the specified path.
        let options: SqliteConnectOptions;
        let path: String = match path.as_ref() {
            ":memory:" => {
                options = SqliteConnectOptions::from_str(":memory:")?;
                ":memory:".into()
            }
            _ => {
                let mut path: PathBuf = path.as_ref().into();
                path = path.resolve().into_owned();
                if let Some(parent) = path.parent() {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        tracing::error!(
                            "Failed to create parent directory: {e}"
                        );
                    }
                }
                let path = path.to_string_lossy().into_owned();
                options = SqliteConnectOptions::new()
                    .filename(path.clone())
                    .create_if_missing(true);
                path
            }
        };

        // Create pool at path.
        tracing::debug!("Using database: {}", &path);
        let pool = SqlitePoolOptions::new()
            .min_connections(2)
            .max_connections(4)
            .connect_with(options)
            .await?;

        // Initialize database.
        Database::initialize(&pool).await?;

        let (events, _) = broadcast::channel(64);
        Ok(Self { path, pool, events })
    }

    /// Initialize the database.
    async fn initialize(pool: &SqlitePool) -> Result<()> {
        let res = sqlx::query(
            "
            CREATE TABLE IF NOT EXISTS users(
                -- Opaque user id.
                id TEXT PRIMARY KEY,
                -- Sign-in email.
                email TEXT NOT NULL UNIQUE,
                -- Name shown on posts.
                display_name TEXT NOT NULL,
                -- Avatar url.
                avatar TEXT NOT NULL,
                -- Argon2id hash, PHC format.
                password_hash TEXT NOT NULL,
                -- When the account was created, ISO-8601.
                created TEXT NOT NULL
            ) STRICT;
            CREATE INDEX IF NOT EXISTS users_email_idx ON users(email);

            CREATE TABLE IF NOT EXISTS sessions(
                -- Session token handed to the client.
                token TEXT PRIMARY KEY,
                user_id TEXT REFERENCES users(id) NOT NULL,
                created TEXT NOT NULL
            ) STRICT;
            CREATE INDEX IF NOT EXISTS sessions_user_id_idx ON sessions(user_id);

            CREATE TABLE IF NOT EXISTS posts(
                -- Opaque post id.
                id TEXT PRIMARY KEY,
                -- When the post was created, ISO-8601.
                -- Lexicographic order is chronological order.
                created TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                -- Author display name, denormalized at post time.
                author TEXT NOT NULL,
                author_id TEXT NOT NULL,
                avatar TEXT NOT NULL,
                subject TEXT NOT NULL,
                kind TEXT NOT NULL,
                -- Optional due date, ISO-8601.
                due TEXT,
                likes INTEGER NOT NULL,
                comments INTEGER NOT NULL
            ) STRICT;
            CREATE INDEX IF NOT EXISTS posts_created_idx ON posts(created);
            CREATE INDEX IF NOT EXISTS posts_subject_idx ON posts(subject);
            CREATE INDEX IF NOT EXISTS posts_kind_idx ON posts(kind);
            CREATE INDEX IF NOT EXISTS posts_author_id_idx ON posts(author_id);

            CREATE TABLE IF NOT EXISTS attachments(
                id INTEGER PRIMARY KEY ASC,
                post_id TEXT REFERENCES posts(id) NOT NULL,
                -- Upload order within the post.
                position INTEGER NOT NULL,
                url TEXT NOT NULL,
                name TEXT NOT NULL,
                mime_type TEXT,
                UNIQUE(post_id, position)
            ) STRICT;
            CREATE INDEX IF NOT EXISTS attachments_post_id_idx ON attachments(post_id);
            ",
        )
        .execute(pool)
        .await;

        if let Err(e) = res {
            bail!("Failed to initialize database: {e}");
        }

        Ok(())
    }

    /// Subscribe to profile-change events.
    pub fn subscribe(&self) -> broadcast::Receiver<ProfileEvent> {
        self.events.subscribe()
    }

    /// Build a post (sans attachments) from a posts row.
    /// Returns None when the stored subject/kind no longer parses.
    fn builder_from_row(row: &SqliteRow) -> Option<PostBuilder> {
        let id: String = row.get("id");
        let subject: String = row.get("subject");
        let kind: String = row.get("kind");
        let subject = match Subject::try_from(subject.as_str()) {
            Ok(subject) => subject,
            Err(_) => {
                tracing::error!("Post {} has unknown subject {}.", id, subject);
                return None;
            }
        };
        let kind = match PostKind::try_from(kind.as_str()) {
            Ok(kind) => kind,
            Err(_) => {
                tracing::error!("Post {} has unknown kind {}.", id, kind);
                return None;
            }
        };

        let mut builder = PostBuilder::new();
        builder
            .id(id)
            .title(row.get::<String, _>("title"))
            .description(row.get::<String, _>("description"))
            .author(row.get::<String, _>("author"))
            .author_id(row.get::<String, _>("author_id"))
            .avatar(row.get::<String, _>("avatar"))
            .subject(subject)
            .kind(kind)
            .likes(row.get::<i64, _>("likes").max(0) as u32)
            .comments(row.get::<i64, _>("comments").max(0) as u32);
        let created: String = row.get("created");
        builder.created(
            DateTime::try_from(&created).unwrap_or_else(|_| DateTime::epoch()),
        );
        if let Some(due) = row.get::<Option<String>, _>("due") {
            if let Ok(due) = DateTime::try_from(&due) {
                builder.due(due);
            }
        }
        Some(builder)
    }

    /// Fold rows of the posts/attachments join back into posts.
    /// Rows for a post are adjacent, attachments in position order.
    fn collect_posts(rows: &[SqliteRow], limit: usize) -> PostSet {
        let mut set = PostSet::new(limit);
        let mut current_id: Option<String> = None;
        let mut builder: Option<PostBuilder> = None;
        for row in rows.iter() {
            let id: String = row.get("id");
            if current_id.as_deref() != Some(id.as_str()) {
                if let Some(done) = builder.take() {
                    set.add(done.build());
                }
                current_id = Some(id);
                builder = Database::builder_from_row(row);
            }
            if let Some(builder) = builder.as_mut() {
                if let Some(url) =
                    row.get::<Option<String>, _>("attachment_url")
                {
                    builder.attachment(Attachment {
                        url,
                        name: row
                            .get::<Option<String>, _>("attachment_name")
                            .unwrap_or_default(),
                        mime_type: row
                            .get::<Option<String>, _>("attachment_mime"),
                    });
                }
            }
        }
        if let Some(done) = builder.take() {
            set.add(done.build());
        }
        set
    }
}

#[studyfeed::backend_trait]
impl studyfeed::IdentityProvider for Database {
    async fn sign_up(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> Result<User, StoreError> {
        if email.is_empty() || !email.contains('@') {
            return Err(StoreError::Invalid("invalid email".into()));
        }
        if display_name.is_empty() {
            return Err(StoreError::Invalid("display name is required".into()));
        }
        if password.len() < 8 {
            return Err(StoreError::Invalid(
                "password must be at least 8 characters".into(),
            ));
        }

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM users WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        if existing.is_some() {
            return Err(StoreError::AccountExists);
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            display_name: display_name.into(),
            email: email.into(),
            avatar: "/default-avatar.png".into(),
        };
        sqlx::query(
            "
            INSERT INTO users (id, email, display_name, avatar, password_hash, created)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.avatar)
        .bind(hash_password(password)?)
        .bind(DateTime::now().to_iso8601())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        tracing::info!("Created account {}.", user.id);
        Ok(user)
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(User, SessionToken), StoreError> {
        let row = sqlx::query(
            "SELECT id, display_name, avatar, password_hash FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        let row = match row {
            Some(row) => row,
            None => return Err(StoreError::Unauthorized),
        };

        let password_hash: String = row.get("password_hash");
        if !verify_password(password, &password_hash)? {
            return Err(StoreError::Unauthorized);
        }

        let user = User {
            id: row.get("id"),
            display_name: row.get("display_name"),
            email: email.into(),
            avatar: row.get("avatar"),
        };
        let token = SessionToken::new(uuid::Uuid::new_v4().to_string());
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created) VALUES (?, ?, ?)",
        )
        .bind(token.as_str())
        .bind(&user.id)
        .bind(DateTime::now().to_iso8601())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok((user, token))
    }

    async fn sign_out(&self, token: &SessionToken) -> Result<(), StoreError> {
        let session: Option<(String,)> =
            sqlx::query_as("SELECT user_id FROM sessions WHERE token = ?")
                .bind(token.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        let user_id = match session {
            Some((user_id,)) => user_id,
            // Signing out an unknown token is a no-op.
            None => return Ok(()),
        };

        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        let remaining: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sessions WHERE user_id = ?",
        )
        .bind(&user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        if remaining.0 == 0 {
            self.events.send(ProfileEvent::SignedOut(user_id)).ok();
        }

        Ok(())
    }

    async fn user_for_token(
        &self,
        token: &SessionToken,
    ) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "
            SELECT users.id, users.email, users.display_name, users.avatar
            FROM sessions
                JOIN users ON users.id = sessions.user_id
            WHERE sessions.token = ?
            ",
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|row| User {
            id: row.get("id"),
            email: row.get("email"),
            display_name: row.get("display_name"),
            avatar: row.get("avatar"),
        }))
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<User, StoreError> {
        let row = sqlx::query(
            "
            UPDATE users SET
                display_name = COALESCE(?, display_name),
                avatar = COALESCE(?, avatar)
            WHERE id = ?
            RETURNING id, email, display_name, avatar
            ",
        )
        .bind(&update.display_name)
        .bind(&update.avatar)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        let row = match row {
            Some(row) => row,
            None => return Err(StoreError::NotFound),
        };

        let user = User {
            id: row.get("id"),
            email: row.get("email"),
            display_name: row.get("display_name"),
            avatar: row.get("avatar"),
        };
        self.events.send(ProfileEvent::Updated(user.clone())).ok();
        Ok(user)
    }

    fn subscribe(&self) -> broadcast::Receiver<ProfileEvent> {
        Database::subscribe(self)
    }
}

#[studyfeed::backend_trait]
impl studyfeed::PostStore for Database {
    async fn create_post(&self, post: &Post) -> Result<(), StoreError> {
        sqlx::query(
            "
            INSERT INTO posts
                (id, created, title, description, author, author_id, avatar,
                 subject, kind, due, likes, comments)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(post.id().as_str())
        .bind(post.created().to_iso8601())
        .bind(post.title())
        .bind(post.description())
        .bind(post.author())
        .bind(post.author_id())
        .bind(post.avatar())
        .bind(post.subject().as_str())
        .bind(post.kind().as_str())
        .bind(post.due().map(|due| due.to_iso8601()))
        .bind(post.likes())
        .bind(post.comments())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        for (position, attachment) in post.attachments().iter().enumerate() {
            sqlx::query(
                "
                INSERT INTO attachments (post_id, position, url, name, mime_type)
                VALUES (?, ?, ?, ?, ?)
                ",
            )
            .bind(post.id().as_str())
            .bind(position as i64)
            .bind(&attachment.url)
            .bind(&attachment.name)
            .bind(&attachment.mime_type)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        }

        tracing::debug!("Stored post {}.", post.id());
        Ok(())
    }

    async fn recent_posts(&self, limit: usize) -> Result<PostSet, StoreError> {
        let rows = sqlx::query(
            "
            SELECT
                posts.id, posts.created, posts.title, posts.description,
                posts.author, posts.author_id, posts.avatar, posts.subject,
                posts.kind, posts.due, posts.likes, posts.comments,
                attachments.url AS attachment_url,
                attachments.name AS attachment_name,
                attachments.mime_type AS attachment_mime
            FROM posts
                LEFT JOIN attachments ON posts.id = attachments.post_id
            WHERE posts.id IN
                (SELECT id FROM posts ORDER BY created DESC, id DESC LIMIT ?)
            ORDER BY posts.created DESC, posts.id DESC, attachments.position ASC
            ",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let set = Database::collect_posts(&rows, limit);
        tracing::trace!("Fetched {} recent posts.", set.len());
        Ok(set)
    }

    async fn posts_by_author(
        &self,
        author_id: &str,
        limit: usize,
    ) -> Result<PostSet, StoreError> {
        let rows = sqlx::query(
            "
            SELECT
                posts.id, posts.created, posts.title, posts.description,
                posts.author, posts.author_id, posts.avatar, posts.subject,
                posts.kind, posts.due, posts.likes, posts.comments,
                attachments.url AS attachment_url,
                attachments.name AS attachment_name,
                attachments.mime_type AS attachment_mime
            FROM posts
                LEFT JOIN attachments ON posts.id = attachments.post_id
            WHERE posts.id IN
                (SELECT id FROM posts WHERE author_id = ?
                 ORDER BY created DESC, id DESC LIMIT ?)
            ORDER BY posts.created DESC, posts.id DESC, attachments.position ASC
            ",
        )
        .bind(author_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let set = Database::collect_posts(&rows, limit);
        tracing::trace!(
            "Fetched {} posts by author {}.",
            set.len(),
            author_id
        );
        Ok(set)
    }

    async fn post(&self, id: &PostId) -> Result<Option<Post>, StoreError> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };
        let mut builder = match Database::builder_from_row(&row) {
            Some(builder) => builder,
            None => return Ok(None),
        };

        let attachments = sqlx::query(
            "
            SELECT url, name, mime_type FROM attachments
            WHERE post_id = ?
            ORDER BY position ASC
            ",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        for row in attachments.iter() {
            builder.attachment(Attachment {
                url: row.get("url"),
                name: row.get("name"),
                mime_type: row.get("mime_type"),
            });
        }

        Ok(Some(builder.build()))
    }
}

/// Log and wrap a database failure.
fn db_err(e: sqlx::Error) -> StoreError {
    tracing::error!("Database failure: {}", e);
    StoreError::Backend(e.to_string())
}

/// Hash a password with argon2id, PHC format.
fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    match Argon2::default().hash_password(password.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(e) => Err(StoreError::Backend(format!(
            "password hashing failed: {e}"
        ))),
    }
}

/// Verify a password against a stored PHC hash.
fn verify_password(
    password: &str,
    password_hash: &str,
) -> Result<bool, StoreError> {
    let parsed = PasswordHash::new(password_hash).map_err(|e| {
        StoreError::Backend(format!("invalid password hash: {e}"))
    })?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(StoreError::Backend(format!(
            "password verification failed: {e}"
        ))),
    }
}
