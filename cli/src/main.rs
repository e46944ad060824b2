use std::path::PathBuf;
use std::rc::Rc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{Value, json};

use mynute_admin::config::{ClientConfig, ConfigError};
use mynute_admin::net::api::ApiClient;
use mynute_admin::net::transport::{HttpTransport, ReqwestTransport};
use mynute_admin::net::types::{AdminInput, CompanyInput, Record};
use mynute_admin::state::admins::AdminStore;
use mynute_admin::state::auth::AuthStore;
use mynute_admin::state::clients::ClientStore;
use mynute_admin::state::companies::CompanyStore;
use mynute_admin::state::session::Session;
use mynute_admin::state::setup::{FirstAdminForm, SetupStore};
use mynute_admin::state::store::{ActionResult, Collection};
use mynute_admin::util::storage::{DurableStorage, FileStorage};


const DEFAULT_STATE_FILE: &str = ".mynute-admin-session.json";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("http client setup failed: {0}")]
    Transport(String),
    #[error("not signed in; run `login` first")]
    NotSignedIn,
    #[error("{0}")]
    Failed(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "mynute-admin", about = "Mynute administration console CLI")]
struct Cli {
    /// Backend origin; the API prefix and timeout come from the environment.
    #[arg(long, env = "MYNUTE_ADMIN_ORIGIN")]
    origin: Option<String>,

    #[arg(long, env = "MYNUTE_ADMIN_STATE_FILE", default_value = DEFAULT_STATE_FILE)]
    state_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "MYNUTE_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Whoami,
    Setup(SetupCommand),
    Admin(AdminCommand),
    Company(CompanyCommand),
    Client(ClientCommand),
}

#[derive(Args, Debug)]
struct SetupCommand {
    #[command(subcommand)]
    command: SetupSubcommand,
}

#[derive(Subcommand, Debug)]
enum SetupSubcommand {
    Status,
    CreateFirstAdmin {
        #[arg(long)]
        name: String,
        #[arg(long)]
        surname: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to `--password`.
        #[arg(long)]
        confirm_password: Option<String>,
    },
    SendVerification {
        #[arg(long)]
        email: String,
    },
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Args, Debug, Default)]
struct AdminFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    surname: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    is_active: Option<bool>,
    /// Repeat for several roles.
    #[arg(long = "role")]
    roles: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    List,
    Create(AdminFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: AdminFields,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct CompanyCommand {
    #[command(subcommand)]
    command: CompanySubcommand,
}

#[derive(Args, Debug, Default)]
struct CompanyFields {
    #[arg(long)]
    legal_name: Option<String>,
    #[arg(long)]
    trade_name: Option<String>,
    #[arg(long)]
    tax_id: Option<String>,
}

#[derive(Subcommand, Debug)]
enum CompanySubcommand {
    List,
    Read {
        id: String,
    },
    Create(CompanyFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: CompanyFields,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct ClientCommand {
    #[command(subcommand)]
    command: ClientSubcommand,
}

#[derive(Subcommand, Debug)]
enum ClientSubcommand {
    List,
    Read { id: String },
    Appointments { id: String },
    Delete { id: String },
}

/// Everything a command needs, built once per invocation.
struct CliContext {
    api: ApiClient,
    auth: AuthStore,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let ctx = build_context(cli.origin.as_deref(), cli.state_file)?;

    let result = run(&ctx, cli.command).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "command failed");
    }
    result
}

async fn run(ctx: &CliContext, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { email, password } => run_login(ctx, &email, &password).await,
        Command::Logout => {
            ctx.auth.logout();
            print_json(&json!({ "success": true }))
        }
        Command::Whoami => run_whoami(ctx),
        Command::Setup(setup) => run_setup(ctx, setup).await,
        Command::Admin(admin) => run_admin(ctx, admin).await,
        Command::Company(company) => run_company(ctx, company).await,
        Command::Client(client) => run_client(ctx, client).await,
    }
}

fn build_context(origin: Option<&str>, state_file: PathBuf) -> Result<CliContext, CliError> {
    let config = resolve_config(ClientConfig::from_env()?, origin)?;
    let transport = ReqwestTransport::new(config.request_timeout_secs).map_err(|e| CliError::Transport(e.0))?;
    let storage = Rc::new(FileStorage::open(state_file));
    tracing::debug!(origin = %config.origin, state_file = %storage.path().display(), "cli configured");
    let session = Session::restore(storage as Rc<dyn DurableStorage>);
    let api = ApiClient::new(config, Rc::new(transport) as Rc<dyn HttpTransport>, session);
    let auth = AuthStore::new(api.clone());
    Ok(CliContext { api, auth })
}

/// An explicit origin wins over the environment-derived one.
fn resolve_config(config: ClientConfig, origin: Option<&str>) -> Result<ClientConfig, CliError> {
    let Some(origin) = origin else {
        return Ok(config);
    };
    let origin = ClientConfig::new(origin)?.origin;
    Ok(ClientConfig { origin, ..config })
}

async fn run_login(ctx: &CliContext, email: &str, password: &str) -> Result<(), CliError> {
    let result = ctx.auth.login(email, password).await;
    action_output(result)?;
    print_json(&ctx.auth.session().user())
}

fn run_whoami(ctx: &CliContext) -> Result<(), CliError> {
    ctx.auth.check_auth();
    let user = ctx.auth.session().user().ok_or(CliError::NotSignedIn)?;
    print_json(&user)
}

/// Store calls that need a token fail fast instead of sending anonymous
/// requests the backend would reject anyway.
fn require_session(ctx: &CliContext) -> Result<(), CliError> {
    ctx.auth.check_auth();
    if ctx.auth.session().is_authenticated() {
        Ok(())
    } else {
        Err(CliError::NotSignedIn)
    }
}

async fn run_setup(ctx: &CliContext, setup: SetupCommand) -> Result<(), CliError> {
    let store = SetupStore::new(ctx.api.clone());
    match setup.command {
        SetupSubcommand::Status => {
            let has_superadmin = store.check_superadmin().await;
            match has_superadmin {
                Some(flag) => print_json(&json!({ "has_superadmin": flag })),
                None => Err(CliError::Failed(store.error.get().unwrap_or_else(|| "request failed".to_owned()))),
            }
        }
        SetupSubcommand::CreateFirstAdmin { name, surname, email, password, confirm_password } => {
            let form = FirstAdminForm {
                name,
                surname,
                email,
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                password,
            };
            let created = action_output(store.create_first_admin(&form).await)?;
            if let Some(message) = store.error.get() {
                tracing::warn!(error = %message, "admin created but verification email was not sent");
            }
            print_json(&json!({
                "admin": created,
                "verification_sent_to": store.verification_sent_to.get(),
            }))
        }
        SetupSubcommand::SendVerification { email } => {
            let sent = action_output(store.send_verification_code(&email).await)?;
            print_json(&sent)
        }
    }
}

async fn run_admin(ctx: &CliContext, admin: AdminCommand) -> Result<(), CliError> {
    require_session(ctx)?;
    let store = AdminStore::new(ctx.api.clone());
    match admin.command {
        AdminSubcommand::List => {
            store.fetch_admins().await;
            print_json(&collection_output(&store.admins)?)
        }
        AdminSubcommand::Create(fields) => {
            let created = action_output(store.create_admin(&admin_input(fields)).await)?;
            print_json(&created)
        }
        AdminSubcommand::Update { id, fields } => {
            let updated = action_output(store.update_admin(&id, &admin_input(fields)).await)?;
            print_json(&updated)
        }
        AdminSubcommand::Delete { id } => {
            let deleted = action_output(store.delete_admin(&id).await)?;
            print_json(&deleted)
        }
    }
}

async fn run_company(ctx: &CliContext, company: CompanyCommand) -> Result<(), CliError> {
    require_session(ctx)?;
    let store = CompanyStore::new(ctx.api.clone());
    match company.command {
        CompanySubcommand::List => {
            store.fetch_companies().await;
            print_json(&collection_output(&store.companies)?)
        }
        CompanySubcommand::Read { id } => {
            store.fetch_company_by_id(&id).await;
            print_json(&selected_output(&store.companies)?)
        }
        CompanySubcommand::Create(fields) => {
            let created = action_output(store.create_company(&company_input(fields)).await)?;
            print_json(&created)
        }
        CompanySubcommand::Update { id, fields } => {
            let updated = action_output(store.update_company(&id, &company_input(fields)).await)?;
            print_json(&updated)
        }
        CompanySubcommand::Delete { id } => {
            let deleted = action_output(store.delete_company(&id).await)?;
            print_json(&deleted)
        }
    }
}

async fn run_client(ctx: &CliContext, client: ClientCommand) -> Result<(), CliError> {
    require_session(ctx)?;
    let store = ClientStore::new(ctx.api.clone());
    match client.command {
        ClientSubcommand::List => {
            store.fetch_clients().await;
            print_json(&collection_output(&store.clients)?)
        }
        ClientSubcommand::Read { id } => {
            store.fetch_client_by_id(&id).await;
            print_json(&selected_output(&store.clients)?)
        }
        ClientSubcommand::Appointments { id } => {
            store.fetch_client_appointments(&id).await;
            if let Some(message) = store.clients.error.get() {
                return Err(CliError::Failed(message));
            }
            print_json(&store.appointments.get())
        }
        ClientSubcommand::Delete { id } => {
            let deleted = action_output(store.delete_client(&id).await)?;
            print_json(&deleted)
        }
    }
}

fn admin_input(fields: AdminFields) -> AdminInput {
    AdminInput {
        name: fields.name,
        surname: fields.surname,
        email: fields.email,
        password: fields.password,
        is_active: fields.is_active,
        roles: (!fields.roles.is_empty()).then_some(fields.roles),
    }
}

fn company_input(fields: CompanyFields) -> CompanyInput {
    CompanyInput {
        legal_name: fields.legal_name,
        trade_name: fields.trade_name,
        tax_id: fields.tax_id,
    }
}

/// Failed results become errors; successful ones print their payload, or
/// `{"success": true}` when there is none.
fn action_output<T: Serialize>(result: ActionResult<T>) -> Result<Value, CliError> {
    if !result.success {
        return Err(CliError::Failed(result.error.unwrap_or_else(|| "request failed".to_owned())));
    }
    match result.data {
        Some(data) => Ok(serde_json::to_value(data)?),
        None => Ok(json!({ "success": true })),
    }
}

fn collection_output<T>(collection: &Collection<T>) -> Result<Value, CliError>
where
    T: Record + Clone + Serialize + serde::de::DeserializeOwned + 'static,
{
    if let Some(message) = collection.error.get() {
        return Err(CliError::Failed(message));
    }
    Ok(serde_json::to_value(collection.items())?)
}

fn selected_output<T>(collection: &Collection<T>) -> Result<Value, CliError>
where
    T: Record + Clone + Serialize + serde::de::DeserializeOwned + 'static,
{
    if let Some(message) = collection.error.get() {
        return Err(CliError::Failed(message));
    }
    Ok(serde_json::to_value(collection.selected.get())?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
