//! Event Horizon CLI
//!
//! Command-line client for an Event Horizon backend:
//! - Manage projects, goals, tasks and knowledge base documents
//! - Browse tasks as a filtered board grouped by status
//! - Bulk-upload files as documents linked to a project
//! - Show dashboards and goal progress
//! - Link documents and task dependencies
//! - Export task details as CSV
//! - Chat with the planning assistant

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

use event_horizon::api::{Backend, ClientResult, HttpBackend};
use event_horizon::chat::{ChatPhase, ChatSession, Role, WebhookClient};
use event_horizon::config::{generate_default_config, Config};
use event_horizon::model::{
    CreateGoal, CreateKnowledge, CreateProject, CreateTask, EffortLevel, EntityKind, Goal,
    GoalScope, KnowledgeBase, Priority, Project, ProjectStatus, Task, TaskDependency, TaskType,
    UpdateGoal, UpdateKnowledge, UpdateProject, UpdateTask, WorkStatus,
};
use event_horizon::views::{
    group_by_status, GoalProgress, ProjectDashboard, TaskDetails, TaskFilter, TaskSort,
};
use event_horizon::{EventHorizon, NotificationKind, UploadFile};

#[derive(Parser)]
#[command(name = "event-horizon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Plan projects as goals and tasks, with a linked knowledge base")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API base URL (default: from config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Config file (default: search standard locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: ProjectCommand,
    },

    /// Manage goals
    Goals {
        #[command(subcommand)]
        action: GoalCommand,
    },

    /// Manage tasks
    Tasks {
        #[command(subcommand)]
        action: TaskCommand,
    },

    /// Manage knowledge base documents
    Knowledge {
        #[command(subcommand)]
        action: KnowledgeCommand,
    },

    /// Project dashboards with goal and task rollups
    Dashboard {
        /// Only this project
        project_id: Option<String>,
    },

    /// Goal progress
    Progress {
        /// Only goals of this project
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Set a task's status
    Status {
        task_id: String,
        /// Not Started, Active, Done or Cancelled
        status: WorkStatus,
    },

    /// Task dependencies
    Deps {
        #[command(subcommand)]
        action: DependencyCommand,
    },

    /// Knowledge base references
    Refs {
        #[command(subcommand)]
        action: ReferenceCommand,
    },

    /// Attach a file to a document
    Attach { knowledge_id: String, path: PathBuf },

    /// Download a document's attachment
    Download {
        knowledge_id: String,
        /// Output file (default: the attachment's filename)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove a document's attachment
    Detach { knowledge_id: String },

    /// Export task details as CSV
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Chat with the planning assistant
    Chat,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    List,
    Show {
        id: String,
    },
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        status: Option<ProjectStatus>,
        /// YYYY-MM-DD
        #[arg(long)]
        start: Option<NaiveDate>,
        /// YYYY-MM-DD
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        months: Option<i64>,
        #[arg(long)]
        inactive: bool,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        status: Option<ProjectStatus>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        months: Option<i64>,
        #[arg(long)]
        active: Option<bool>,
    },
    Delete {
        id: String,
    },
    /// Goals of a project
    Goals {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum GoalCommand {
    List,
    Show {
        id: String,
    },
    Create {
        name: String,
        #[arg(short, long)]
        project: String,
        /// Monthly, Quarterly or Weekly-Milestone
        #[arg(long)]
        scope: Option<GoalScope>,
        #[arg(long)]
        parent: Option<String>,
        #[arg(short, long)]
        status: Option<WorkStatus>,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(short, long)]
        description: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        scope: Option<GoalScope>,
        #[arg(long)]
        parent: Option<String>,
        #[arg(short, long)]
        status: Option<WorkStatus>,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(short, long)]
        description: Option<String>,
    },
    Delete {
        id: String,
    },
    /// Tasks of a goal
    Tasks {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Task board with goal and dependency names
    List {
        /// all, projects (active projects), goals (active goals) or milestones
        #[arg(long, default_value = "all")]
        filter: TaskFilter,
        /// status (board order) or newest
        #[arg(long, default_value = "status")]
        sort: TaskSort,
        /// One section per status
        #[arg(long)]
        group: bool,
    },
    Show {
        id: String,
    },
    Create {
        name: String,
        #[arg(short, long)]
        goal: String,
        #[arg(short, long)]
        status: Option<WorkStatus>,
        /// Minutes
        #[arg(short, long)]
        estimate: Option<i64>,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long = "type")]
        task_type: Option<TaskType>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        effort: Option<EffortLevel>,
        #[arg(long)]
        assignee: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        goal: Option<String>,
        #[arg(short, long)]
        status: Option<WorkStatus>,
        #[arg(short, long)]
        estimate: Option<i64>,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long)]
        completed: Option<NaiveDate>,
        #[arg(long = "type")]
        task_type: Option<TaskType>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        effort: Option<EffortLevel>,
        #[arg(long)]
        assignee: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum KnowledgeCommand {
    List,
    Show {
        id: String,
    },
    Create {
        name: String,
        /// Read the Markdown body from a file
        #[arg(short, long)]
        content: Option<PathBuf>,
        #[arg(short, long)]
        summary: Option<String>,
        #[arg(long = "citation")]
        citations: Vec<String>,
        #[arg(long = "project")]
        projects: Vec<String>,
        #[arg(long = "goal")]
        goals: Vec<String>,
        #[arg(long = "task")]
        tasks: Vec<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        content: Option<PathBuf>,
        #[arg(short, long)]
        summary: Option<String>,
        /// Replaces all citations
        #[arg(long = "citation")]
        citations: Vec<String>,
    },
    Delete {
        id: String,
    },
    /// Documents referencing an entity
    For { kind: EntityKind, id: String },
    /// One document per file, each linked to a project
    Bulk {
        #[arg(short, long)]
        project: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum DependencyCommand {
    List,
    /// TASK cannot start before ON is done
    Add { task: String, on: String },
    Remove { task: String, on: String },
}

#[derive(Subcommand)]
pub enum ReferenceCommand {
    Add {
        knowledge_id: String,
        kind: EntityKind,
        entity_id: String,
    },
    Remove {
        knowledge_id: String,
        kind: EntityKind,
        entity_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    config.logging.init_tracing();

    match cli.command {
        Commands::Config { output } => write_config(output.as_deref()),
        Commands::Chat => run_chat(&config).await,
        command => {
            let backend = HttpBackend::new(config.api.base_url.clone(), config.api.timeout())?;
            let mut app = EventHorizon::with_config(backend, config.knowledge.clone());

            let report = app.load_all().await;
            for (collection, message) in &report.failed {
                eprintln!("warning: could not load {}: {}", collection, message);
            }
            app.drain_notifications();

            run_command(&mut app, command, cli.format).await
        }
    }
}

async fn run_command(
    app: &mut EventHorizon<HttpBackend>,
    command: Commands,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let now = Utc::now();

    match command {
        Commands::Projects { action } => match action {
            ProjectCommand::List => emit(format, app.store().projects())?,
            ProjectCommand::Show { id } => {
                let project = found(app.backend().get_project(&id).await?, "Project", &id)?;
                emit(format, &[project])?;
            }
            ProjectCommand::Create {
                name,
                description,
                status,
                start,
                end,
                months,
                inactive,
            } => {
                let mut payload = CreateProject::new(name)
                    .dates(start, end)
                    .active(!inactive);
                payload.description = description;
                payload.time_estimate_months = months;
                if let Some(status) = status {
                    payload = payload.status(status);
                }
                let result = app.create_project(payload).await;
                emit(format, &[settle(app, result)])?;
            }
            ProjectCommand::Update {
                id,
                name,
                description,
                status,
                start,
                end,
                months,
                active,
            } => {
                let payload = UpdateProject {
                    name,
                    description,
                    status,
                    start_date: start,
                    end_date: end,
                    time_estimate_months: months,
                    is_active: active,
                    ..Default::default()
                };
                let result = app.update_project(&id, payload).await;
                emit(format, &[settle(app, result)])?;
            }
            ProjectCommand::Delete { id } => {
                let result = app.delete_project(&id).await;
                settle(app, result);
            }
            ProjectCommand::Goals { id } => {
                emit(format, &app.backend().project_goals(&id).await?)?;
            }
        },

        Commands::Goals { action } => match action {
            GoalCommand::List => emit(format, app.store().goals())?,
            GoalCommand::Show { id } => {
                let goal = found(app.backend().get_goal(&id).await?, "Goal", &id)?;
                emit(format, &[goal])?;
            }
            GoalCommand::Create {
                name,
                project,
                scope,
                parent,
                status,
                due,
                description,
            } => {
                let payload = CreateGoal {
                    name,
                    project_id: project,
                    scope,
                    parent_goal_id: parent,
                    status: status.unwrap_or_default(),
                    due_date: due,
                    description,
                    ..Default::default()
                };
                let result = app.create_goal(payload).await;
                emit(format, &[settle(app, result)])?;
            }
            GoalCommand::Update {
                id,
                name,
                scope,
                parent,
                status,
                due,
                description,
            } => {
                let payload = UpdateGoal {
                    name,
                    scope,
                    parent_goal_id: parent,
                    status,
                    due_date: due,
                    description,
                    ..Default::default()
                };
                let result = app.update_goal(&id, payload).await;
                emit(format, &[settle(app, result)])?;
            }
            GoalCommand::Delete { id } => {
                let result = app.delete_goal(&id).await;
                settle(app, result);
            }
            GoalCommand::Tasks { id } => {
                emit(format, &app.backend().goal_tasks(&id).await?)?;
            }
        },

        Commands::Tasks { action } => match action {
            TaskCommand::List {
                filter,
                sort,
                group,
            } => {
                let board = app.task_board(filter, sort, now);
                if !group {
                    emit(format, &board)?;
                } else {
                    let columns = group_by_status(board);
                    match format {
                        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&columns)?),
                        OutputFormat::Csv => {
                            let rows: Vec<TaskDetails> =
                                columns.into_iter().flat_map(|c| c.tasks).collect();
                            emit(format, &rows)?;
                        }
                        OutputFormat::Table => {
                            for column in &columns {
                                println!("== {} ({}) ==", column.status, column.tasks.len());
                                print_table(&column.tasks);
                                println!();
                            }
                        }
                    }
                }
            }
            TaskCommand::Show { id } => {
                let task = found(app.backend().get_task(&id).await?, "Task", &id)?;
                emit(format, &[task])?;
            }
            TaskCommand::Create {
                name,
                goal,
                status,
                estimate,
                due,
                task_type,
                priority,
                effort,
                assignee,
            } => {
                let payload = CreateTask {
                    name,
                    goal_id: goal,
                    status: status.unwrap_or_default(),
                    time_estimate_minutes: estimate,
                    due_date: due,
                    task_type,
                    priority,
                    effort_level: effort,
                    assignee,
                    ..Default::default()
                };
                let result = app.create_task(payload).await;
                emit(format, &[settle(app, result)])?;
            }
            TaskCommand::Update {
                id,
                name,
                goal,
                status,
                estimate,
                due,
                completed,
                task_type,
                priority,
                effort,
                assignee,
            } => {
                let payload = UpdateTask {
                    name,
                    goal_id: goal,
                    status,
                    time_estimate_minutes: estimate,
                    due_date: due,
                    date_completed: completed,
                    task_type,
                    priority,
                    effort_level: effort,
                    assignee,
                    ..Default::default()
                };
                let result = app.update_task(&id, payload).await;
                emit(format, &[settle(app, result)])?;
            }
            TaskCommand::Delete { id } => {
                let result = app.delete_task(&id).await;
                settle(app, result);
            }
        },

        Commands::Knowledge { action } => match action {
            KnowledgeCommand::List => emit(format, app.store().knowledge())?,
            KnowledgeCommand::Show { id } => {
                let doc = found(app.backend().get_knowledge(&id).await?, "Document", &id)?;
                match format {
                    OutputFormat::Table => {
                        println!("# {}", doc.document_name);
                        if !doc.related_entities.is_empty() {
                            println!("Linked to: {}", doc.related_entities.join(", "));
                        }
                        println!();
                        println!("{}", doc.content.as_deref().unwrap_or(""));
                    }
                    _ => emit(format, &[doc])?,
                }
            }
            KnowledgeCommand::Create {
                name,
                content,
                summary,
                citations,
                projects,
                goals,
                tasks,
            } => {
                let payload = CreateKnowledge {
                    document_name: name,
                    content: read_content(content.as_deref())?,
                    ai_summary: summary,
                    link_citations: citations,
                    related_projects: projects,
                    related_goals: goals,
                    related_tasks: tasks,
                };
                let result = app.create_knowledge(payload).await;
                emit(format, &[settle(app, result)])?;
            }
            KnowledgeCommand::Update {
                id,
                name,
                content,
                summary,
                citations,
            } => {
                let payload = UpdateKnowledge {
                    document_name: name,
                    content: read_content(content.as_deref())?,
                    ai_summary: summary,
                    link_citations: (!citations.is_empty()).then_some(citations),
                };
                let result = app.update_knowledge(&id, payload).await;
                emit(format, &[settle(app, result)])?;
            }
            KnowledgeCommand::Delete { id } => {
                let result = app.delete_knowledge(&id).await;
                settle(app, result);
            }
            KnowledgeCommand::For { kind, id } => {
                emit(format, &app.backend().knowledge_for_entity(kind, &id).await?)?;
            }
            KnowledgeCommand::Bulk { project, files } => {
                let mut uploads = Vec::with_capacity(files.len());
                for path in &files {
                    let bytes =
                        std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
                    let filename = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .with_context(|| format!("Not a file: {:?}", path))?;
                    uploads.push(UploadFile { filename, bytes });
                }

                let result = app
                    .bulk_upload_knowledge(&project, uploads, |done, total, name| {
                        eprintln!("[{}/{}] {}", done, total, name)
                    })
                    .await;
                let report = settle(app, result);
                for (file, reason) in &report.failed {
                    eprintln!("error: {}: {}", file, reason);
                }
                emit(format, &report.uploaded)?;
            }
        },

        Commands::Dashboard { project_id } => {
            let dashboards = match project_id {
                Some(id) => vec![found(app.dashboard(&id, now), "Project", &id)?],
                None => app.dashboards(now),
            };
            emit(format, &dashboards)?;
        }

        Commands::Progress { project } => {
            let progress: Vec<GoalProgress> = app
                .goal_progress(now)
                .into_iter()
                .filter(|g| project.as_deref().map_or(true, |id| g.goal.project_id == id))
                .collect();
            emit(format, &progress)?;
        }

        Commands::Status { task_id, status } => {
            let result = app.set_task_status(&task_id, status).await;
            emit(format, &[settle(app, result)])?;
        }

        Commands::Deps { action } => match action {
            DependencyCommand::List => emit(format, app.store().dependencies())?,
            DependencyCommand::Add { task, on } => {
                let result = app.add_task_dependency(&task, &on).await;
                emit(format, &[settle(app, result)])?;
            }
            DependencyCommand::Remove { task, on } => {
                let result = app.remove_task_dependency(&task, &on).await;
                settle(app, result);
            }
        },

        Commands::Refs { action } => match action {
            ReferenceCommand::Add {
                knowledge_id,
                kind,
                entity_id,
            } => {
                let result = app
                    .add_knowledge_reference(&knowledge_id, kind, &entity_id)
                    .await;
                emit(format, &[settle(app, result)])?;
            }
            ReferenceCommand::Remove {
                knowledge_id,
                kind,
                entity_id,
            } => {
                let result = app
                    .remove_knowledge_reference(&knowledge_id, kind, &entity_id)
                    .await;
                emit(format, &[settle(app, result)])?;
            }
        },

        Commands::Attach { knowledge_id, path } => {
            let bytes = std::fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .with_context(|| format!("Not a file: {:?}", path))?;
            let result = app.upload_attachment(&knowledge_id, &filename, bytes).await;
            settle(app, result);
        }

        Commands::Download {
            knowledge_id,
            output,
        } => {
            let result = app.download_attachment(&knowledge_id).await;
            let attachment = settle(app, result);
            let path = output.unwrap_or_else(|| PathBuf::from(&attachment.filename));
            std::fs::write(&path, &attachment.bytes)
                .with_context(|| format!("Failed to write {:?}", path))?;
            println!("Saved {} bytes to {:?}", attachment.bytes.len(), path);
        }

        Commands::Detach { knowledge_id } => {
            let result = app.delete_attachment(&knowledge_id).await;
            settle(app, result);
        }

        Commands::Export { output } => {
            let details = app.task_details(now);
            match output {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("Failed to create {:?}", path))?;
                    write_csv(file, &details)?;
                    println!("Exported {} tasks to {:?}", details.len(), path);
                }
                None => write_csv(std::io::stdout(), &details)?,
            }
        }

        Commands::Chat | Commands::Config { .. } => bail!("command does not use the backend"),
    }

    Ok(())
}

/// Print queued notifications; exit on failure
fn settle<T>(app: &mut EventHorizon<HttpBackend>, result: ClientResult<T>) -> T {
    for notification in app.drain_notifications() {
        match notification.kind {
            NotificationKind::Success => eprintln!("{}", notification.message),
            NotificationKind::Error => eprintln!("error: {}", notification.message),
        }
    }
    match result {
        Ok(value) => value,
        Err(_) => std::process::exit(1),
    }
}

fn found<T>(value: Option<T>, kind: &str, id: &str) -> anyhow::Result<T> {
    match value {
        Some(v) => Ok(v),
        None => bail!("{} not found: {}", kind, id),
    }
}

fn read_content(path: Option<&Path>) -> anyhow::Result<Option<String>> {
    path.map(|p| std::fs::read_to_string(p).with_context(|| format!("Failed to read {:?}", p)))
        .transpose()
}

fn write_config(output: Option<&Path>) -> anyhow::Result<()> {
    let config = generate_default_config();

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &config)?;
            println!("Config written to {:?}", path);
        }
        None => print!("{}", config),
    }
    Ok(())
}

// ============================================
// Chat
// ============================================

async fn run_chat(config: &Config) -> anyhow::Result<()> {
    let client = WebhookClient::new(config.chat.webhook_url.clone(), config.chat.timeout())?;
    let mut chat = ChatSession::new(client);

    println!("Planning assistant. Commands: /new, /history, /open N, /back, /quit");
    start_chat(&mut chat).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => {}
            "/quit" | "/exit" => break,
            "/new" => start_chat(&mut chat).await,
            "/back" => {
                chat.back();
                print_history(&chat);
            }
            "/history" => print_history(&chat),
            _ if line.starts_with("/open") => {
                let index: Option<usize> = line["/open".len()..].trim().parse().ok();
                let id = index
                    .and_then(|i| i.checked_sub(1))
                    .and_then(|i| chat.history().get(i).map(|c| c.id.clone()));
                match id.map(|id| chat.open(&id)) {
                    Some(Ok(())) => {
                        for message in chat.messages() {
                            print_message(message.role, &message.content);
                        }
                        println!("(read only, use /new to start a session)");
                    }
                    _ => eprintln!("error: no such conversation"),
                }
            }
            text => match chat.send(text).await {
                Ok(Some(reply)) => print_message(reply.role, &reply.content),
                Ok(None) => {}
                Err(e) => eprintln!("error: {}", e),
            },
        }
        prompt();
    }
    Ok(())
}

async fn start_chat(chat: &mut ChatSession<WebhookClient>) {
    match chat.new_chat().await {
        Ok(ChatPhase::AwaitingResume { .. }) => {
            eprintln!("warning: the assistant did not return a resume URL");
        }
        Ok(_) => {}
        Err(e) => {
            eprintln!("error: could not start a session: {}", e);
            return;
        }
    }
    if let Some(message) = chat.messages().last() {
        print_message(message.role, &message.content);
    }
}

fn print_history(chat: &ChatSession<WebhookClient>) {
    let history = chat.history();
    if history.is_empty() {
        println!("No conversations yet.");
    }
    for (i, conversation) in history.iter().enumerate() {
        println!(
            "{:>3}. {:<44} {:>3} messages  {}",
            i + 1,
            conversation.title,
            conversation.message_count,
            conversation.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
}

fn print_message(role: Role, content: &str) {
    match role {
        Role::User => println!("you> {}", content),
        Role::Agent => println!("assistant> {}", content),
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

// ============================================
// Output
// ============================================

/// Rows for table and CSV output
trait Tabular {
    fn headers() -> &'static [&'static str];
    fn row(&self) -> Vec<String>;
}

fn opt<T: Display>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn emit<T: Tabular + Serialize>(format: OutputFormat, items: &[T]) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputFormat::Csv => write_csv(std::io::stdout(), items)?,
        OutputFormat::Table => print_table(items),
    }
    Ok(())
}

fn write_csv<T: Tabular, W: Write>(writer: W, items: &[T]) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(T::headers())?;
    for item in items {
        csv.write_record(item.row())?;
    }
    csv.flush()?;
    Ok(())
}

fn print_table<T: Tabular>(items: &[T]) {
    if items.is_empty() {
        println!("No results");
        return;
    }

    let headers = T::headers();
    let rows: Vec<Vec<String>> = items.iter().map(Tabular::row).collect();
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(h.len()))
                .max()
                .unwrap_or(0)
                .min(40)
        })
        .collect();

    let line = |cells: Vec<String>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| {
                let cell: String = cell.chars().take(*w).collect();
                format!("{:<width$}", cell, width = *w)
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(headers.iter().map(|h| h.to_string()).collect()));
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
    for row in rows {
        println!("{}", line(row));
    }
}

impl Tabular for Project {
    fn headers() -> &'static [&'static str] {
        &["ID", "NAME", "STATUS", "START", "END", "ACTIVE", "MONTHS"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.status.to_string(),
            opt(&self.start_date),
            opt(&self.end_date),
            self.is_active.to_string(),
            opt(&self.time_estimate_months),
        ]
    }
}

impl Tabular for Goal {
    fn headers() -> &'static [&'static str] {
        &["ID", "NAME", "SCOPE", "STATUS", "DUE", "PROJECT", "PARENT"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            opt(&self.scope),
            self.status.to_string(),
            opt(&self.due_date),
            self.project_id.clone(),
            opt(&self.parent_goal_id),
        ]
    }
}

impl Tabular for Task {
    fn headers() -> &'static [&'static str] {
        &["ID", "NAME", "STATUS", "PRIORITY", "MINUTES", "DUE", "COMPLETED", "GOAL"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.status.to_string(),
            opt(&self.priority),
            opt(&self.time_estimate_minutes),
            opt(&self.due_date),
            opt(&self.date_completed),
            self.goal_id.clone(),
        ]
    }
}

impl Tabular for KnowledgeBase {
    fn headers() -> &'static [&'static str] {
        &["ID", "NAME", "ADDED", "ATTACHMENT", "LINKED TO"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.document_name.clone(),
            self.date_added.to_string(),
            opt(&self.file_attachment),
            self.related_entities.join("; "),
        ]
    }
}

impl Tabular for TaskDependency {
    fn headers() -> &'static [&'static str] {
        &["ID", "TASK", "DEPENDS ON", "CREATED"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.task_id.clone(),
            self.depends_on_task_id.clone(),
            self.created_at.format("%Y-%m-%d %H:%M").to_string(),
        ]
    }
}

impl Tabular for ProjectDashboard {
    fn headers() -> &'static [&'static str] {
        &["ID", "PROJECT", "GOALS", "TASKS", "OVERDUE", "TASK %", "GOAL %", "MINUTES"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.project.id.clone(),
            self.project.name.clone(),
            format!("{}/{}", self.completed_goals, self.total_goals),
            format!("{}/{}", self.completed_tasks, self.total_tasks),
            self.overdue_tasks.to_string(),
            self.task_progress_percentage.to_string(),
            self.goal_progress_percentage.to_string(),
            format!(
                "{}/{}",
                self.completed_estimated_minutes, self.total_estimated_minutes
            ),
        ]
    }
}

impl Tabular for GoalProgress {
    fn headers() -> &'static [&'static str] {
        &["ID", "GOAL", "PROJECT", "PARENT", "TASKS", "PROGRESS %", "OVERDUE", "DAYS LEFT"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.goal.id.clone(),
            self.goal.name.clone(),
            self.project_name.clone(),
            opt(&self.parent_goal_name),
            format!("{}/{}", self.completed_tasks, self.total_tasks),
            self.progress_percentage.to_string(),
            self.is_overdue.to_string(),
            opt(&self.days_until_due),
        ]
    }
}

impl Tabular for TaskDetails {
    fn headers() -> &'static [&'static str] {
        &[
            "ID",
            "TASK",
            "STATUS",
            "PROJECT",
            "GOAL",
            "DEPENDS ON",
            "BLOCKS",
            "OVERDUE",
            "DAYS LEFT",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.task.id.clone(),
            self.task.name.clone(),
            self.task.status.to_string(),
            self.project_name.clone(),
            self.goal_name.clone(),
            self.dependencies.join("; "),
            self.blocks_tasks.join("; "),
            self.is_overdue.to_string(),
            opt(&self.days_until_due),
        ]
    }
}
