use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use contactdesk::app::AppContext;
use contactdesk::config::{ClientConfig, ConfigError, normalize_api_url};
use contactdesk::net::ApiError;
use contactdesk::net::types::{
    ContactData, ContactId, EmailAddress, LoginRequest, PhoneNumber, ProfileUpdate, RegisterRequest,
};
use contactdesk::state::auth::AuthState;
use contactdesk::state::notices::NoticeLevel;
use contactdesk::state::profile::{PasswordForm, ProfileError};
use contactdesk::storage::MemoryStorage;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Profile(#[from] ProfileError),
    #[error("not logged in; run `contactdesk login` first")]
    NotLoggedIn,
    #[error("cannot tell the image type of {0}; pass --mime")]
    UnknownImageType(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "contactdesk", about = "Contact manager client")]
struct Cli {
    /// API base URL; overrides CONTACTDESK_API_URL.
    #[arg(long)]
    api_url: Option<String>,

    /// Session storage file; overrides CONTACTDESK_STORAGE_PATH.
    #[arg(long)]
    storage_path: Option<PathBuf>,

    /// Keep the session in memory only.
    #[arg(long, default_value_t = false)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "CONTACTDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long, env = "CONTACTDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Whoami,
    Profile(ProfileCommand),
    Contacts(ContactsCommand),
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
    },
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
    DeleteAccount {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    Avatar(AvatarCommand),
}

#[derive(Args, Debug)]
struct AvatarCommand {
    #[command(subcommand)]
    command: AvatarSubcommand,
}

#[derive(Subcommand, Debug)]
enum AvatarSubcommand {
    Set {
        file: PathBuf,
        #[arg(long)]
        mime: Option<String>,
    },
    Remove,
}

#[derive(Args, Debug)]
struct ContactsCommand {
    #[command(subcommand)]
    command: ContactsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ContactsSubcommand {
    List {
        #[arg(long, default_value_t = false)]
        favorites: bool,
        /// Local case-insensitive name filter.
        #[arg(long)]
        filter: Option<String>,
    },
    Search {
        query: String,
    },
    Count,
    Show {
        id: i64,
    },
    Create(ContactFields),
    Update {
        id: i64,
        #[command(flatten)]
        fields: ContactPatch,
    },
    Delete {
        id: i64,
    },
    Favorite {
        id: i64,
    },
}

#[derive(Args, Debug)]
struct ContactFields {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    title: Option<String>,
    /// `number` or `number=label`; repeatable.
    #[arg(long = "phone")]
    phones: Vec<String>,
    /// `address` or `address=label`; repeatable.
    #[arg(long = "email")]
    emails: Vec<String>,
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long, default_value_t = false)]
    favorite: bool,
}

#[derive(Args, Debug)]
struct ContactPatch {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    title: Option<String>,
    /// Replaces all phone numbers when given.
    #[arg(long = "phone")]
    phones: Vec<String>,
    /// Replaces all email addresses when given.
    #[arg(long = "email")]
    emails: Vec<String>,
    /// Replaces all tags when given.
    #[arg(long = "tag")]
    tags: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!(error = %e, "failed to load .env");
        }
    }

    let cli = Cli::parse();
    let ctx = build_context(&cli)?;
    let result = run(&ctx, cli.command).await;
    flush_notices(&ctx);
    result
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn build_context(cli: &Cli) -> Result<AppContext, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config.api_url = normalize_api_url(url);
    }
    if let Some(path) = &cli.storage_path {
        config.storage_path.clone_from(path);
    }
    let ctx = if cli.ephemeral {
        AppContext::with_storage(&config, Arc::new(MemoryStorage::new()))?
    } else {
        AppContext::from_config(&config)?
    };
    Ok(ctx)
}

async fn run(ctx: &AppContext, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { username, password } => {
            let identity = ctx.auth.login(&LoginRequest { username, password }).await?;
            println!("logged in as {}", identity.display_name());
            Ok(())
        }
        Command::Logout => {
            ctx.auth.logout();
            println!("logged out");
            Ok(())
        }
        Command::Register { first_name, last_name, email, phone, password } => {
            let request = RegisterRequest { first_name, last_name, email, phone_number: phone, password };
            let response = ctx.auth.register(&request).await?;
            print_json(&response)
        }
        Command::Whoami => {
            let state = ctx.auth.initialize().await;
            let identity = ctx.auth.identity();
            print_json(&serde_json::json!({
                "authenticated": state == AuthState::Authenticated,
                "identity": identity,
                "hasProfileImage": ctx.auth.profile_image().is_some(),
            }))
        }
        Command::Profile(profile) => {
            require_session(ctx).await?;
            run_profile(ctx, profile.command).await
        }
        Command::Contacts(contacts) => {
            require_session(ctx).await?;
            run_contacts(ctx, contacts.command).await
        }
    }
}

async fn require_session(ctx: &AppContext) -> Result<(), CliError> {
    match ctx.auth.initialize().await {
        AuthState::Authenticated => Ok(()),
        AuthState::Unknown | AuthState::Unauthenticated => Err(CliError::NotLoggedIn),
    }
}

async fn run_profile(ctx: &AppContext, command: ProfileSubcommand) -> Result<(), CliError> {
    match command {
        ProfileSubcommand::Show => {
            let identity = ctx.account.load().await?;
            print_json(&identity)
        }
        ProfileSubcommand::Update { first_name, last_name, email, phone } => {
            let update = ProfileUpdate { first_name, last_name, email, phone_number: phone };
            let identity = ctx.account.update(&update).await?;
            print_json(&identity)
        }
        ProfileSubcommand::Password { current, new, confirm } => {
            let form = PasswordForm { current_password: current, new_password: new, confirm_password: confirm };
            ctx.account.change_password(&form).await?;
            Ok(())
        }
        ProfileSubcommand::DeleteAccount { yes } => {
            if !yes {
                eprintln!("refusing to delete the account without --yes");
                return Ok(());
            }
            ctx.account.delete().await?;
            Ok(())
        }
        ProfileSubcommand::Avatar(avatar) => match avatar.command {
            AvatarSubcommand::Set { file, mime } => {
                let mime = match mime {
                    Some(mime) => mime,
                    None => guess_mime(&file).ok_or_else(|| CliError::UnknownImageType(file.clone()))?.to_owned(),
                };
                let bytes = std::fs::read(&file)?;
                ctx.account.set_image(&bytes, &mime).await?;
                println!("profile image stored ({} bytes)", bytes.len());
                Ok(())
            }
            AvatarSubcommand::Remove => {
                ctx.account.remove_image().await?;
                println!("profile image removed");
                Ok(())
            }
        },
    }
}

async fn run_contacts(ctx: &AppContext, command: ContactsSubcommand) -> Result<(), CliError> {
    let book = &ctx.contacts;
    match command {
        ContactsSubcommand::List { favorites, filter } => {
            book.refresh().await?;
            let state = book.snapshot().await;
            print_json(&state.filtered(filter.as_deref().unwrap_or_default(), favorites))
        }
        ContactsSubcommand::Search { query } => {
            book.search(&query).await?;
            print_json(&book.snapshot().await.items)
        }
        ContactsSubcommand::Count => {
            println!("{}", book.count().await);
            Ok(())
        }
        ContactsSubcommand::Show { id } => {
            let contact = book.fetch(ContactId(id)).await?;
            print_json(&contact)
        }
        ContactsSubcommand::Create(fields) => {
            let created = book.create(&fields.into_data()).await?;
            print_json(&created)
        }
        ContactsSubcommand::Update { id, fields } => {
            let existing = book.fetch(ContactId(id)).await?;
            let mut data = ContactData::from(&existing);
            fields.apply(&mut data);
            let updated = book.update(ContactId(id), &data).await?;
            print_json(&updated)
        }
        ContactsSubcommand::Delete { id } => {
            book.delete(ContactId(id)).await?;
            Ok(())
        }
        ContactsSubcommand::Favorite { id } => {
            book.refresh().await?;
            book.toggle_favorite(ContactId(id)).await?;
            let state = book.snapshot().await;
            match state.find(ContactId(id)) {
                Some(contact) => println!("{} favorite: {}", contact.full_name(), contact.is_favorite),
                None => println!("favorite toggled"),
            }
            Ok(())
        }
    }
}

impl ContactFields {
    fn into_data(self) -> ContactData {
        ContactData {
            first_name: self.first_name,
            last_name: self.last_name,
            title: self.title,
            phone_numbers: self.phones.iter().map(|p| parse_phone(p)).collect(),
            email_addresses: self.emails.iter().map(|e| parse_email(e)).collect(),
            tags: self.tags,
            profile_image: None,
            is_favorite: self.favorite,
        }
    }
}

impl ContactPatch {
    fn apply(self, data: &mut ContactData) {
        if let Some(first_name) = self.first_name {
            data.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            data.last_name = last_name;
        }
        if self.title.is_some() {
            data.title = self.title;
        }
        if !self.phones.is_empty() {
            data.phone_numbers = self.phones.iter().map(|p| parse_phone(p)).collect();
        }
        if !self.emails.is_empty() {
            data.email_addresses = self.emails.iter().map(|e| parse_email(e)).collect();
        }
        if !self.tags.is_empty() {
            data.tags = self.tags;
        }
    }
}

fn split_label(raw: &str) -> (String, Option<String>) {
    match raw.split_once('=') {
        Some((value, label)) if !label.trim().is_empty() => (value.trim().to_owned(), Some(label.trim().to_owned())),
        Some((value, _)) => (value.trim().to_owned(), None),
        None => (raw.trim().to_owned(), None),
    }
}

fn parse_phone(raw: &str) -> PhoneNumber {
    let (phone, label) = split_label(raw);
    PhoneNumber { id: None, phone, label }
}

fn parse_email(raw: &str) -> EmailAddress {
    let (email, label) = split_label(raw);
    EmailAddress { id: None, email, label }
}

fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn flush_notices(ctx: &AppContext) {
    for notice in ctx.notices.drain() {
        match notice.level {
            NoticeLevel::Success => println!("{}", notice.message),
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
