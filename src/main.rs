use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use clientdesk::api::ApiClient;
use clientdesk::auth::{AdminLogin, AdminSession};
use clientdesk::config::Config;
use clientdesk::error::{ClientDeskError, Result};
use clientdesk::interfaces::ui::SharedSink;
use clientdesk::storage::{FileStore, LocalStore};
use clientdesk::terminal::TerminalSink;
use clientdesk::widgets::add_client::{AddClientForm, AddClientModal};
use clientdesk::widgets::ai_prompt::AiPromptEditor;
use clientdesk::widgets::prompt_list::{PromptListEditor, PromptScope};
use clientdesk::widgets::public_chat::{PublicChat, SubmitOutcome};
use clientdesk::widgets::roster::{NewClientForm, RosterManager};
use clientdesk::widgets::roster_viewer::{RosterSource, RosterViewer, ViewerState};
use clientdesk::widgets::session_chat::SessionChat;

#[derive(Parser, Debug)]
#[command(name = "clientdesk")]
#[command(version = clientdesk::BUILD_REV)]
#[command(about = "Client roster, prompt editing and chat for the admin dashboard backend")]
struct Cli {
    /// JSON config file; defaults to <data dir>/config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, env = "CLIENTDESK_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, global = true, env = "CLIENTDESK_ADMIN_USER")]
    admin_user: Option<String>,

    #[arg(long, global = true, env = "CLIENTDESK_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Admin session chat; reads messages from stdin when none are given
    Chat {
        #[arg(long)]
        page: Option<String>,
        message: Vec<String>,
    },
    Clients {
        #[command(subcommand)]
        action: ClientsAction,
    },
    /// Read-only roster behind the admin credential
    Roster,
    AiPrompt {
        #[command(subcommand)]
        action: AiPromptAction,
    },
    Prompts {
        /// Edit one client's prompts instead of the global set
        #[arg(long)]
        client: Option<i64>,
        #[command(subcommand)]
        action: PromptsAction,
    },
    /// Public chat for the tenant named in the page URL
    PublicChat {
        /// Page location, e.g. https://host/c/acme-123/chat
        #[arg(long)]
        url: String,
        #[arg(long)]
        slug: Option<String>,
        message: Vec<String>,
    },
    AddClient {
        #[arg(long)]
        name: String,
        #[arg(long)]
        instagram_username: String,
        #[arg(long)]
        api_key: String,
        #[arg(long, default_value_t = false)]
        active: bool,
        #[arg(long, default_value = "")]
        ai_prompt: String,
    },
}

#[derive(Subcommand, Debug)]
enum ClientsAction {
    List {
        #[arg(long, default_value = "")]
        filter: String,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    Delete {
        id: i64,
        /// Skip the confirmation question
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum AiPromptAction {
    Show { client_id: i64 },
    Set { client_id: i64, text: String },
}

#[derive(Subcommand, Debug)]
enum PromptsAction {
    List,
    Set { key: String, value: String },
}

struct App {
    config: Config,
    api: ApiClient,
    session: Option<AdminSession>,
    sink: SharedSink,
}

impl App {
    fn admin_api(&self) -> Result<ApiClient> {
        let session = self.session.clone().ok_or_else(|| {
            ClientDeskError::Config(
                "this command needs --admin-password or CLIENTDESK_ADMIN_PASSWORD".to_string(),
            )
        })?;
        Ok(self.api.with_session(session))
    }

    /// Admin session when one was established, plain client otherwise.
    fn best_api(&self) -> ApiClient {
        match &self.session {
            Some(session) => self.api.with_session(session.clone()),
            None => self.api.clone(),
        }
    }
}

async fn read_line(prompt: &str) -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(prompt.as_bytes())
        .await
        .map_err(|e| ClientDeskError::Runtime(e.to_string()))?;
    stdout
        .flush()
        .await
        .map_err(|e| ClientDeskError::Runtime(e.to_string()))?;
    let mut line = String::new();
    let read = BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .map_err(|e| ClientDeskError::Runtime(e.to_string()))?;
    Ok((read > 0).then_some(line))
}

async fn run_chat(app: &App, page: Option<String>, message: Vec<String>) -> Result<()> {
    let store: Arc<dyn LocalStore> = Arc::new(FileStore::open_default());
    let mut chat = SessionChat::new(
        app.best_api(),
        store,
        app.sink.clone(),
        page.as_deref().unwrap_or(&app.config.chat_page),
        &app.config.session_storage_key,
    )?;

    if !message.is_empty() {
        chat.submit(&message.join(" ")).await?;
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| ClientDeskError::Runtime(e.to_string()))?
    {
        // failures are already shown in the transcript
        let _ = chat.submit(&line).await;
    }
    Ok(())
}

async fn run_clients(app: &App, action: ClientsAction) -> Result<()> {
    let mut roster = RosterManager::new(app.best_api(), app.sink.clone());
    match action {
        ClientsAction::List { filter } => {
            roster.load().await?;
            if !filter.trim().is_empty() {
                roster.set_filter(&filter);
            }
        }
        ClientsAction::Create { name, email } => {
            roster.open_new();
            roster.submit_new(&NewClientForm::new(name, email)).await?;
        }
        ClientsAction::Delete { id, yes } => {
            roster.load().await?;
            let name = roster
                .clients()
                .iter()
                .find(|client| client.id == id)
                .map(|client| client.name.clone())
                .unwrap_or_default();
            roster.request_delete(id, &name);
            let confirmed = yes
                || read_line("Type 'yes' to confirm: ")
                    .await?
                    .map(|answer| answer.trim().eq_ignore_ascii_case("yes"))
                    .unwrap_or(false);
            if confirmed {
                roster.confirm_delete().await?;
            } else {
                roster.cancel_delete();
            }
        }
    }
    Ok(())
}

async fn run_public_chat(
    app: &App,
    url: &str,
    slug: Option<&str>,
    message: Vec<String>,
) -> Result<()> {
    let Some(chat) = PublicChat::bind(app.api.clone(), app.sink.clone(), slug, url) else {
        return Err(ClientDeskError::Validation(format!(
            "no chat slug in {url}; pass --slug or a /c/<slug> URL"
        )));
    };

    if !message.is_empty() {
        if chat.submit(&message.join(" ")).await == SubmitOutcome::Failed {
            std::process::exit(1);
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| ClientDeskError::Runtime(e.to_string()))?
    {
        chat.submit(&line).await;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    clientdesk::logging::init_tracing("clientdesk");
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(user) = cli.admin_user {
        config.admin_user = user;
    }
    let config = config.validated()?;

    let api = ApiClient::from_config(&config)?;
    let session = match cli.admin_password.as_deref() {
        Some(password) => Some(AdminLogin::login(&api, &config.admin_user, password).await?),
        None => None,
    };
    let app = App {
        config,
        api,
        session,
        sink: Arc::new(TerminalSink::default()),
    };

    match cli.command {
        Command::Chat { page, message } => run_chat(&app, page, message).await?,
        Command::Clients { action } => run_clients(&app, action).await?,
        Command::Roster => {
            let source = RosterSource::from(&app.config.roster_source);
            let mut viewer = RosterViewer::new(app.admin_api()?, source, app.sink.clone())?;
            if let ViewerState::Failed(_) = viewer.load().await {
                std::process::exit(1);
            }
        }
        Command::AiPrompt { action } => {
            let revert = Duration::from_millis(app.config.status_revert_millis);
            match action {
                AiPromptAction::Show { client_id } => {
                    let mut editor =
                        AiPromptEditor::new(app.best_api(), app.sink.clone(), client_id, revert);
                    editor.load().await?;
                    println!("{}", editor.text());
                }
                AiPromptAction::Set { client_id, text } => {
                    let mut editor =
                        AiPromptEditor::new(app.best_api(), app.sink.clone(), client_id, revert);
                    editor.set_text(text);
                    editor.save().await?;
                }
            }
        }
        Command::Prompts { client, action } => {
            let scope = client.map(PromptScope::Client).unwrap_or(PromptScope::Global);
            let mut editor = PromptListEditor::new(app.admin_api()?, scope, app.sink.clone())?;
            editor.load().await?;
            if let PromptsAction::Set { key, value } = action {
                editor.open_edit(&key);
                editor.set_draft(value);
                editor.save().await?;
            }
        }
        Command::PublicChat { url, slug, message } => {
            run_public_chat(&app, &url, slug.as_deref(), message).await?
        }
        Command::AddClient {
            name,
            instagram_username,
            api_key,
            active,
            ai_prompt,
        } => {
            let mut modal = AddClientModal::new(app.admin_api()?, app.sink.clone());
            modal.open();
            let outcome = modal
                .submit(&AddClientForm {
                    name,
                    instagram_username,
                    api_key,
                    active,
                    ai_prompt,
                })
                .await?;
            if let Some(code) = outcome.redirect_param("ok") {
                println!("✔ {code}");
            }
        }
    }
    Ok(())
}
