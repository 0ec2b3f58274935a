use clap::{Args, Parser, Subcommand};

/// harbortidy — Harbor registry browser and stale-tag cleaner
#[derive(Parser, Debug)]
#[command(name = "harbortidy", version, about)]
pub struct Cli {
    /// Harbor API base URL (e.g., https://registry.example.com/api/v2.0)
    #[arg(long, env = "HARBOR_API_URL")]
    pub api_url: String,

    /// Harbor account name
    #[arg(long, env = "HARBOR_USERNAME")]
    pub username: String,

    /// Harbor account password
    #[arg(long, env = "HARBOR_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List projects
    ListProjects(ListProjectsArgs),
    /// List every repository the account is authorized to read
    AllRepos(PageArgs),
    /// List repositories inside one project
    ProjectRepos(ProjectArgs),
    /// List artifacts inside one repository
    Artifacts(RepoArgs),
    /// Delete tags older than the retention threshold
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct PageArgs {
    /// Items per page
    #[arg(long, default_value_t = 100)]
    pub page_size: u32,
}

#[derive(Args, Debug)]
pub struct ListProjectsArgs {
    #[command(flatten)]
    pub page: PageArgs,

    /// Filter by project name
    #[arg(long)]
    pub name: Option<String>,

    /// Filter by project owner
    #[arg(long)]
    pub owner: Option<String>,

    /// Filter by visibility (true/false; omit for both)
    #[arg(long)]
    pub public: Option<bool>,

    /// Ask the API for detailed project records (true/false)
    #[arg(long)]
    pub with_detail: Option<bool>,
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Project name
    #[arg(long)]
    pub project: String,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct RepoArgs {
    /// Project name the repository lives in
    #[arg(long)]
    pub project: String,

    /// Repository name
    #[arg(long)]
    pub repo: String,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub target: RepoArgs,

    /// Age threshold in days (blank keeps the 30-day default)
    #[arg(long)]
    pub days: Option<String>,
}
