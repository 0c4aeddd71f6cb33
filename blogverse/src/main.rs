//! BlogVerse client runtime: wires the session against local adapters and
//! prints the view model for one route as JSON.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use blogverse::BlogverseSettings;
use blogverse::domain::{
    AllowedEmail, DEFAULT_CATEGORY, EmailAddress, GuardDecision, Identity, IdentityId,
    KNOWN_CATEGORIES, Session, SessionPorts,
};
use blogverse::outbound::{
    FilePreferenceStorage, HttpImageUploader, InMemoryAuthProvider, InMemoryDocumentStore,
};
use blogverse::views::{Access, PostDetailView, Route, category_page, dashboard, home_feed};
use cap_std::{ambient_authority, fs::Dir};
use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use serde_json::{Value, json};
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `blogverse` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "blogverse",
    about = "Render a BlogVerse page model from seeded content",
    version
)]
struct CliArgs {
    /// Route to render, for example `/`, `/News` or `/Blog/abc123`.
    #[arg(default_value = "/")]
    route: String,
    /// Email to sign in with before rendering.
    #[arg(long, value_name = "email", requires = "password")]
    email: Option<String>,
    /// Password for `--email`; also registered for the allowed account.
    #[arg(long, value_name = "password")]
    password: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::try_parse()?;
    let settings = BlogverseSettings::load_from_iter([OsString::from("blogverse")])
        .map_err(|err| eyre!("load settings: {err}"))?;
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(run(args, settings))
}

async fn run(args: CliArgs, settings: BlogverseSettings) -> Result<()> {
    let route = Route::parse(&args.route).ok_or_else(|| eyre!("unknown route: {}", args.route))?;
    let allowed = AllowedEmail::new(settings.allowed_email())?;

    let documents = Arc::new(InMemoryDocumentStore::new(Arc::new(DefaultClock)));
    if let Some(seed) = read_seed(&settings.seed_path())? {
        documents.seed(&seed)?;
    }
    let mut auth = InMemoryAuthProvider::new();
    if let Some(password) = args.password.as_deref() {
        let admin = Identity::new(
            IdentityId::new("admin")?,
            Some(EmailAddress::new(settings.allowed_email())?),
            true,
        );
        auth = auth.with_account(admin, password);
    }
    let images = HttpImageUploader::new(settings.upload_endpoint()?, settings.upload_timeout())?;
    let ports = SessionPorts {
        auth: Arc::new(auth),
        documents,
        images: Arc::new(images),
        preferences: Arc::new(FilePreferenceStorage::new(settings.preferences_path())),
    };

    let session = Session::new(ports, allowed, settings.upload_preset());
    let handle = session.start();
    session.gate().resolved().await;
    if let (Some(email), Some(password)) = (args.email.as_deref(), args.password.as_deref()) {
        session.sign_in(email, password).await?;
    }
    if let Err(err) = session.repository().list_all().await {
        warn!(error = %err, "initial post load failed");
    }

    let view = render(&session, &route).await?;
    handle.stop().await;

    let page = json!({
        "route": route,
        "theme": session.theme().current().as_str(),
        "view": view,
    });
    let mut out = io::stdout().lock();
    writeln!(out, "{}", serde_json::to_string_pretty(&page)?)?;
    Ok(())
}

async fn render(session: &Session, route: &Route) -> Result<Value> {
    let posts = session.repository().state().posts;
    if let Access::Guarded(decision) = route.access(&session.gate().state()) {
        match decision {
            GuardDecision::Loading => return Ok(json!({ "guard": "loading" })),
            GuardDecision::RedirectToLogin { from } => {
                return Ok(json!({ "guard": "redirect", "to": Route::Login, "from": from }));
            }
            GuardDecision::Render(_) => {}
        }
    }
    let view = match route {
        Route::Home => serde_json::to_value(home_feed(&posts))?,
        Route::Category(category) => serde_json::to_value(category_page(&posts, category))?,
        Route::PostDetail(id) => {
            let page = PostDetailView::open(id.clone());
            page.load(session.repository().clone()).await;
            serde_json::to_value(page.state())?
        }
        Route::Dashboard => {
            let identity = session.gate().current_identity();
            if let Err(err) = session.profiles().load(identity.as_ref()).await {
                warn!(error = %err, "profile load failed");
            }
            serde_json::to_value(dashboard(&posts, &session.profiles().state()))?
        }
        Route::AddPost => json!({
            "categories": KNOWN_CATEGORIES,
            "defaultCategory": DEFAULT_CATEGORY,
        }),
        Route::EditPost(id) => match session.repository().get_by_id(id).await? {
            Some(post) => json!({ "post": post, "tags": post.tags.to_input() }),
            None => json!({ "post": Value::Null }),
        },
        Route::Login => {
            let signed_in_as = session
                .gate()
                .current_identity()
                .and_then(|identity| identity.email().map(ToString::to_string));
            json!({ "signedInAs": signed_in_as })
        }
    };
    Ok(view)
}

fn read_seed(path: &Path) -> Result<Option<Value>> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| eyre!("seed path must include a file name: {}", path.display()))?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .wrap_err_with(|| format!("open seed directory {}", parent.display()))?;
    let mut file = match dir.open(file_name) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no seed file; starting empty");
            return Ok(None);
        }
        Err(err) => return Err(err).wrap_err_with(|| format!("open seed {}", path.display())),
    };
    let mut raw = String::new();
    file.read_to_string(&mut raw)
        .wrap_err_with(|| format!("read seed {}", path.display()))?;
    let seed = serde_json::from_str(&raw).wrap_err_with(|| format!("parse seed {}", path.display()))?;
    Ok(Some(seed))
}
