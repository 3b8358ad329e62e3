use resource_framework::observability::setup_tracing;
use resource_framework::{Actor, ListParams, ResourceApi};
use resource_service::config::ServiceConfig;
use resource_service::lifecycle::ResourceSystem;
use resource_service::model::{PostCreate, UserCreate, UserUpdate};
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let config = ServiceConfig::load()?;
    let system = ResourceSystem::new(&config);

    let mut events = system.subscribe();
    let listener = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event.message() {
                Some(message) => info!(resource = event.resource, kind = ?event.kind, detail = message, "Event"),
                None => info!(resource = event.resource, kind = ?event.kind, "Event"),
            }
        }
    });

    let admin = Some(Actor::new("admin"));

    let span = tracing::info_span!("user_creation");
    let user = async {
        system
            .users
            .create_user(
                UserCreate {
                    full_name: Some("Ada Lovelace".into()),
                    email: "ada@example.org".into(),
                    username: Some("ada".into()),
                    ..Default::default()
                },
                admin.clone(),
            )
            .await
    }
    .instrument(span)
    .await?;
    info!(code = %user.code, "User created");

    // Same username again: rejected with the offending field.
    if let Err(e) = system
        .users
        .create_user(
            UserCreate {
                email: "other@example.org".into(),
                username: Some("ada".into()),
                ..Default::default()
            },
            admin.clone(),
        )
        .await
    {
        warn!(error = %e, status = e.status(), "Duplicate rejected");
    }

    let author = Some(Actor::new(user.code.clone()));
    let span = tracing::info_span!("post_creation");
    let post = async {
        system
            .posts
            .create_post(
                PostCreate {
                    title: "Notes on the Analytical Engine".into(),
                    content: "The engine weaves algebraic patterns.".into(),
                    author: user.code.clone(),
                },
                author.clone(),
            )
            .await
    }
    .instrument(span)
    .await?;
    info!(code = %post.code, author = ?post.author, "Post created");

    system
        .users
        .update_user(
            &user.code,
            UserUpdate {
                full_name: Some("Augusta Ada King".into()),
                ..Default::default()
            },
            admin.clone(),
        )
        .await?;

    // The post listing is rebuilt with the renamed author.
    let mine = system
        .posts
        .list(
            ListParams {
                filter: Some("my".into()),
                ..Default::default()
            },
            author,
        )
        .await?;
    for post in &mine {
        info!(code = %post.code, author = ?post.author, "My post");
    }

    system.users.remove(&user.code, admin).await?;
    let orphan = system.posts.get(&post.code).await?;
    info!(code = %orphan.code, author = ?orphan.author, "Post after author removal");

    system.shutdown().await?;
    listener.abort();
    info!("Demo completed");
    Ok(())
}
