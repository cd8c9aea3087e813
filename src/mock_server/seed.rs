//! Demo data for the mock server

use chrono::{Duration, Utc};

use crate::api::{Backend, ClientResult, MemoryBackend};
use crate::model::{
    CreateGoal, CreateKnowledge, CreateProject, CreateTask, DependencyRequest, EffortLevel,
    EntityKind, GoalScope, Priority, ProjectStatus, TaskType, WorkStatus,
};

/// Populate a backend with one project and a small goal/task tree
pub async fn seed_demo_data(backend: &MemoryBackend) -> ClientResult<()> {
    let today = Utc::now().date_naive();

    let project = backend
        .create_project(
            &CreateProject::new("Website Relaunch")
                .description("Rebuild the marketing site and docs portal")
                .status(ProjectStatus::Active)
                .dates(Some(today - Duration::days(14)), Some(today + Duration::days(76)))
                .active(true)
                .estimate_months(3),
        )
        .await?;

    let quarter = backend
        .create_goal(
            &CreateGoal::new("Launch new site", &project.id)
                .scope(GoalScope::Quarterly)
                .status(WorkStatus::Active)
                .due(today + Duration::days(76)),
        )
        .await?;
    let month = backend
        .create_goal(
            &CreateGoal::new("Content migration", &project.id)
                .scope(GoalScope::Monthly)
                .parent(&quarter.id)
                .due(today + Duration::days(20)),
        )
        .await?;
    let week = backend
        .create_goal(
            &CreateGoal::new("Audit existing pages", &project.id)
                .scope(GoalScope::WeeklyMilestone)
                .parent(&month.id)
                .due(today + Duration::days(3)),
        )
        .await?;

    let inventory = backend
        .create_task(
            &CreateTask::new("Export page inventory", &week.id)
                .status(WorkStatus::Done)
                .estimate(45)
                .classify(TaskType::Research, Priority::High, EffortLevel::Small),
        )
        .await?;
    let review = backend
        .create_task(
            &CreateTask::new("Flag outdated pages", &week.id)
                .status(WorkStatus::Active)
                .estimate(120)
                .due(today - Duration::days(1))
                .classify(TaskType::Review, Priority::Medium, EffortLevel::Medium)
                .assignee("sam"),
        )
        .await?;
    backend
        .create_task(
            &CreateTask::new("Set up redirects", &month.id)
                .estimate(90)
                .due(today + Duration::days(10))
                .classify(TaskType::Develop, Priority::Medium, EffortLevel::Medium),
        )
        .await?;

    backend
        .add_dependency(&DependencyRequest {
            task_id: review.id.clone(),
            depends_on_task_id: inventory.id.clone(),
        })
        .await?;

    backend
        .create_knowledge(
            &CreateKnowledge::new("Migration checklist")
                .content("# Migration checklist\n\n- [ ] Inventory\n- [ ] Redirect map\n")
                .summary("Steps for moving content to the new site")
                .citation("https://developers.google.com/search/docs/crawling-indexing/site-move-with-url-changes")
                .relate(EntityKind::Project, &project.id)
                .relate(EntityKind::Goal, &month.id),
        )
        .await?;

    tracing::info!(project_id = %project.id, "Seeded demo data");
    Ok(())
}
