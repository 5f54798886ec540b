use anyhow::{Context, Error};
use directories::ProjectDirs;
use smartplan::{
    routes::Route, storage::FileStorage, App, BrandingUpdate, BusinessUpdate,
    Channel, Config, Credentials, LogoUpload, NewPlan, PlanId, PlanStatus,
    PlanType, PlanUpdate, Registration, SessionAccess, SettingsUpdate,
    SocialUpdate, Timeline,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use structopt::StructOpt;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::from_args();

    log::debug!("Starting application with {:#?}", args);

    let config = Config::new(&args.api_url)?
        .with_timeout(args.timeout.map(Duration::from_secs));

    // the session survives between runs, much like a browser's local storage
    let state_file = args.state_file();
    let storage = FileStorage::open(&state_file).with_context(|| {
        format!("Unable to open the session file at {}", state_file.display())
    })?;
    log::debug!("Using the session saved in {}", storage.path().display());

    let mut app = App::new(&config, Arc::new(storage))?;
    app.start().await;

    let result = run(&mut app, args.cmd).await;
    app.pump_events();

    result
}

async fn run(app: &mut App, cmd: Command) -> Result<(), Error> {
    if let Some(target) = cmd.route() {
        let landed = app.navigate(target);

        if landed != target {
            log::debug!("Tried to visit {} but ended up on {}", target, landed);

            if landed == Route::Login {
                anyhow::bail!("You need to log in first");
            }

            match app.session().user() {
                Some(user) => println!("Already logged in as {}", user.email),
                None => println!("Already logged in"),
            }
            return Ok(());
        }
    }

    match cmd {
        Command::Login { email, password } => {
            let user = app
                .session()
                .login(&Credentials::new(email, password))
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Logged in as {}", user.email);
        },
        Command::Register {
            name,
            email,
            password,
        } => {
            let registration = Registration {
                name,
                email,
                password,
            };
            let user = app
                .session()
                .register(&registration)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Created an account for {}", user.email);
        },
        Command::Logout => {
            app.session().logout().await;
            println!("Logged out");
        },
        Command::Whoami => match app.session().user() {
            Some(user) if app.session().is_authenticated() => {
                println!("{} <{}>", user.name, user.email)
            },
            _ => println!("Not logged in"),
        },
        Command::Plans(cmd) => plans(app, cmd).await?,
        Command::Settings(cmd) => settings(app, cmd).await?,
    }

    Ok(())
}

async fn plans(app: &App, cmd: PlansCommand) -> Result<(), Error> {
    let store = app.plans();

    match cmd {
        PlansCommand::List => {
            for plan in store.fetch_plans().await? {
                println!(
                    "{}\t{}\t{}",
                    plan.id,
                    plan.status.map(|s| s.to_string()).unwrap_or_default(),
                    plan.title
                );
            }
        },
        PlansCommand::Show { id } => {
            let plan = store.get_plan(id).await?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        },
        PlansCommand::Create {
            plan_type,
            channels,
            timeline,
        } => {
            let new = NewPlan {
                plan_type,
                channels,
                timeline,
            };
            let plan = store.create_plan(&new).await?;
            println!("Created plan {}", plan.id);
        },
        PlansCommand::Update {
            id,
            title,
            status,
            timeline,
            content,
        } => {
            let content = content
                .map(|raw| serde_json::from_str(&raw))
                .transpose()
                .context("The plan's content must be valid JSON")?;
            let update = PlanUpdate {
                title,
                status,
                timeline,
                content,
                ..PlanUpdate::default()
            };
            let plan = store.update_plan(id, &update).await?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        },
        PlansCommand::Delete { id } => {
            store.delete_plan(id).await?;
            println!("Deleted plan {}", id);
        },
    }

    Ok(())
}

async fn settings(app: &App, cmd: SettingsCommand) -> Result<(), Error> {
    let store = app.settings();

    let profile = match cmd {
        SettingsCommand::Show => store.fetch_settings().await?,
        SettingsCommand::Business(update) => {
            store
                .save_settings(&SettingsUpdate::Business(update.into()))
                .await?
        },
        SettingsCommand::Social(update) => {
            store
                .save_settings(&SettingsUpdate::Social(update.into()))
                .await?
        },
        SettingsCommand::Branding(update) => {
            store
                .save_settings(&SettingsUpdate::Branding(update.into()))
                .await?
        },
        SettingsCommand::Logo { path } => {
            let bytes = std::fs::read(&path).with_context(|| {
                format!("Unable to read \"{}\"", path.display())
            })?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| String::from("logo"));

            store.upload_logo(&LogoUpload::new(filename, bytes)).await?
        },
    };

    println!("{}", serde_json::to_string_pretty(&profile)?);

    Ok(())
}

#[derive(Debug, StructOpt)]
#[structopt(about = "Manage your SmartPlans from the command line")]
struct Args {
    #[structopt(
        long = "api-url",
        env = "SMARTPLAN_API_URL",
        default_value = "http://localhost:8000/api/",
        help = "The SmartPlan API's base URL"
    )]
    api_url: String,
    #[structopt(
        long = "state-file",
        env = "SMARTPLAN_STATE_FILE",
        parse(from_os_str),
        help = "Where to keep the session between runs"
    )]
    state_file: Option<PathBuf>,
    #[structopt(
        long = "timeout",
        env = "SMARTPLAN_TIMEOUT",
        help = "Give up on requests after this many seconds"
    )]
    timeout: Option<u64>,
    #[structopt(subcommand)]
    cmd: Command,
}

impl Args {
    fn state_file(&self) -> PathBuf {
        if let Some(path) = &self.state_file {
            return path.clone();
        }

        match ProjectDirs::from("com", "SmartPlan", "smartplan") {
            Some(dirs) => dirs.data_dir().join("session.json"),
            None => PathBuf::from(".smartplan-session.json"),
        }
    }
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Log in to an existing account.
    Login {
        #[structopt(short = "e", long = "email", help = "Your email address")]
        email: String,
        #[structopt(
            short = "p",
            long = "password",
            env = "SMARTPLAN_PASSWORD",
            hide_env_values = true,
            help = "Your password"
        )]
        password: String,
    },
    /// Create a new account and log in to it.
    Register {
        #[structopt(short = "n", long = "name", help = "Your name")]
        name: String,
        #[structopt(short = "e", long = "email", help = "Your email address")]
        email: String,
        #[structopt(
            short = "p",
            long = "password",
            env = "SMARTPLAN_PASSWORD",
            hide_env_values = true,
            help = "Your password"
        )]
        password: String,
    },
    /// Forget the current session.
    Logout,
    /// Show who is logged in.
    Whoami,
    /// Work with your plans.
    Plans(PlansCommand),
    /// View or change your account settings.
    Settings(SettingsCommand),
}

impl Command {
    /// The page this command would be run from, if it needs one.
    fn route(&self) -> Option<Route> {
        match self {
            Command::Login { .. } => Some(Route::Login),
            Command::Register { .. } => Some(Route::Register),
            Command::Logout | Command::Whoami => None,
            Command::Plans(PlansCommand::List) => Some(Route::Plans),
            Command::Plans(PlansCommand::Create { plan_type, .. }) => {
                Some(Route::PlanCreate(*plan_type))
            },
            Command::Plans(PlansCommand::Show { id })
            | Command::Plans(PlansCommand::Update { id, .. })
            | Command::Plans(PlansCommand::Delete { id }) => {
                Some(Route::PlanDetail(*id))
            },
            Command::Settings(_) => Some(Route::Settings),
        }
    }
}

#[derive(Debug, StructOpt)]
enum PlansCommand {
    /// List every plan, newest first.
    List,
    /// Show a single plan.
    Show { id: PlanId },
    /// Start generating a new plan.
    Create {
        #[structopt(
            long = "type",
            help = "Who the plan is for (past-clients or open-house)"
        )]
        plan_type: PlanType,
        #[structopt(
            short = "c",
            long = "channel",
            required = true,
            help = "How to reach people (email, voicemail, video or text)"
        )]
        channels: Vec<Channel>,
        #[structopt(
            long = "timeline",
            default_value = "30days",
            help = "How long the plan runs for (30days, 60days or 90days)"
        )]
        timeline: Timeline,
    },
    /// Change parts of an existing plan.
    Update {
        id: PlanId,
        #[structopt(long = "title")]
        title: Option<String>,
        #[structopt(long = "status")]
        status: Option<PlanStatus>,
        #[structopt(long = "timeline")]
        timeline: Option<Timeline>,
        #[structopt(long = "content", help = "The plan's content, as JSON")]
        content: Option<String>,
    },
    /// Delete a plan.
    Delete { id: PlanId },
}

#[derive(Debug, StructOpt)]
enum SettingsCommand {
    /// Show the current settings.
    Show,
    /// Replace your business details.
    Business(BusinessArgs),
    /// Update your social media links.
    Social(SocialArgs),
    /// Update your branding.
    Branding(BrandingArgs),
    /// Upload a new logo.
    Logo {
        #[structopt(parse(from_os_str))]
        path: PathBuf,
    },
}

#[derive(Debug, StructOpt)]
struct BusinessArgs {
    #[structopt(long = "name")]
    name: Option<String>,
    #[structopt(long = "phone")]
    phone: Option<String>,
    #[structopt(long = "address", help = "The business's address, as JSON")]
    address: Option<String>,
    #[structopt(long = "target-market")]
    target_market: Option<String>,
    #[structopt(long = "value-proposition")]
    value_proposition: Option<String>,
    #[structopt(long = "additional-context")]
    additional_context: Option<String>,
}

impl From<BusinessArgs> for BusinessUpdate {
    fn from(args: BusinessArgs) -> BusinessUpdate {
        BusinessUpdate {
            name: args.name,
            phone: args.phone,
            // free-form addresses are sent as plain strings
            address: args.address.map(|raw| {
                serde_json::from_str(&raw)
                    .unwrap_or_else(|_| serde_json::Value::String(raw))
            }),
            target_market: args.target_market,
            value_proposition: args.value_proposition,
            additional_context: args.additional_context,
        }
    }
}

#[derive(Debug, StructOpt)]
struct SocialArgs {
    #[structopt(long = "instagram")]
    instagram: Option<String>,
    #[structopt(long = "facebook")]
    facebook: Option<String>,
    #[structopt(long = "tiktok")]
    tiktok: Option<String>,
    #[structopt(long = "linkedin")]
    linkedin: Option<String>,
    #[structopt(long = "youtube")]
    youtube: Option<String>,
    #[structopt(long = "twitter")]
    twitter: Option<String>,
    #[structopt(long = "threads")]
    threads: Option<String>,
}

impl From<SocialArgs> for SocialUpdate {
    fn from(args: SocialArgs) -> SocialUpdate {
        SocialUpdate {
            instagram: args.instagram,
            facebook: args.facebook,
            tiktok: args.tiktok,
            linkedin: args.linkedin,
            youtube: args.youtube,
            twitter: args.twitter,
            threads: args.threads,
        }
    }
}

#[derive(Debug, StructOpt)]
struct BrandingArgs {
    #[structopt(long = "primary-color")]
    primary_color: Option<String>,
    #[structopt(long = "secondary-color")]
    secondary_color: Option<String>,
    #[structopt(long = "brand-voice")]
    brand_voice: Option<String>,
    #[structopt(long = "brand-description")]
    brand_description: Option<String>,
}

impl From<BrandingArgs> for BrandingUpdate {
    fn from(args: BrandingArgs) -> BrandingUpdate {
        BrandingUpdate {
            primary_color: args.primary_color,
            secondary_color: args.secondary_color,
            brand_voice: args.brand_voice,
            brand_description: args.brand_description,
        }
    }
}
