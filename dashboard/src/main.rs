use std::io::{self, Write};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use log::{debug, error, info};

use dashboard::api::tenants::resolve_tenant;
use dashboard::api::ApiClient;
use dashboard::render::{
    animate_cards, render_chart, render_funnel, render_heading, render_rankings, render_state, Theme,
};
use dashboard::{AnalyticsService, Config, DashboardContext, Emptiness, FileStore, Overview, ViewState};
use shared::analytics::popularity::BAR_CHART_LIMIT;
use shared::models::query::parse_iso_date;
use shared::{
    AnalyticsQuery, ClientGame, ClientGameInfoUpdate, ConversionView, CreateGameRequest, DailySeriesView,
    EngagementView, Game, GameStatus, GameType, MetricKind, PerformanceView, PopularityView, ReliabilityView,
    StatCard, TrafficView, UpdateGameRequest,
};

#[derive(Parser, Debug)]
#[command(name = "dashboard")]
#[command(about = "Gaming platform admin dashboard: analytics, games and tenant configuration")]
struct Cli {
    /// Tenant to report on; defaults to the saved selection
    #[arg(long, global = true, env = "DASHBOARD_TENANT")]
    tenant: Option<String>,
    /// Start of the date range (YYYY-MM-DD)
    #[arg(long, global = true, value_parser = parse_date)]
    from: Option<NaiveDate>,
    /// End of the date range (YYYY-MM-DD)
    #[arg(long, global = true, value_parser = parse_date)]
    to: Option<NaiveDate>,
    /// Print final values without counting up
    #[arg(long, global = true, default_value_t = false)]
    no_animate: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Every analytics panel at once
    Overview {
        /// Include engagement for this game
        #[arg(long)]
        game: Option<String>,
    },
    /// Hub visits and unique visitors
    Traffic,
    /// Sessions, completion and time spent for one game
    Engagement {
        #[arg(long)]
        game: String,
    },
    /// Answer accuracy and response times
    Performance {
        #[arg(long)]
        game: Option<String>,
    },
    /// Most played games
    Popularity {
        #[arg(long, default_value_t = shared::DEFAULT_POPULARITY_LIMIT)]
        limit: u32,
    },
    /// Hub visit to game completion funnel
    Funnel {
        #[arg(long)]
        game: Option<String>,
    },
    /// Error volume and rate
    Reliability,
    /// One of the daily series (daily-active-users, game-plays, ...)
    Series {
        #[arg(long, value_parser = parse_kind)]
        kind: MetricKind,
        #[arg(long)]
        game: Option<String>,
    },
    /// List tenants
    Tenants,
    /// Save the selected tenant
    UseTenant { tenant_id: String },
    /// Switch between dark and light output
    Theme(ThemeArgs),
    /// Game catalog
    #[command(subcommand)]
    Games(GamesCommand),
    /// Per-tenant game configuration
    #[command(subcommand)]
    ClientGames(ClientGamesCommand),
    /// Backend health
    Health,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ThemeArgs {
    #[arg(long)]
    dark: bool,
    #[arg(long)]
    light: bool,
}

#[derive(Subcommand, Debug)]
enum GamesCommand {
    List {
        #[arg(long, value_parser = parse_status)]
        status: Option<GameStatus>,
    },
    Show {
        game_id: String,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        url: String,
        #[arg(long = "type", value_parser = parse_game_type, default_value = "HOSTED_LINK")]
        game_type: GameType,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_status, default_value = "ACTIVE")]
        status: GameStatus,
    },
    /// Change a game's catalog details; unset flags are left as they are
    Edit {
        game_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long = "type", value_parser = parse_game_type)]
        game_type: Option<GameType>,
        #[arg(long)]
        description: Option<String>,
    },
    SetStatus {
        game_id: String,
        #[arg(value_parser = parse_status)]
        status: GameStatus,
    },
    Delete {
        game_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ClientGamesCommand {
    List,
    Show {
        game_id: String,
    },
    /// Hide a game for the tenant (`--show` reverses it)
    Hide {
        game_id: String,
        #[arg(long, default_value_t = false)]
        show: bool,
    },
    Edit {
        game_id: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Publish,
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    parse_iso_date(value).map_err(|e| e.to_string())
}

fn parse_kind(value: &str) -> std::result::Result<MetricKind, String> {
    value.parse::<MetricKind>().map_err(|e| e.to_string())
}

fn parse_status(value: &str) -> std::result::Result<GameStatus, String> {
    value.parse::<GameStatus>().map_err(|e| e.to_string())
}

fn parse_game_type(value: &str) -> std::result::Result<GameType, String> {
    value.parse::<GameType>().map_err(|e| e.to_string())
}

struct App {
    config: Config,
    client: ApiClient,
    service: AnalyticsService,
    context: DashboardContext,
    theme: Theme,
    animation: Duration,
}

impl App {
    /// Explicit `--tenant`, else the saved selection, else the first tenant
    async fn tenant_id(&mut self, cli_tenant: Option<&str>) -> Result<String> {
        if let Some(tenant) = cli_tenant.filter(|t| !t.trim().is_empty()) {
            return Ok(tenant.to_string());
        }
        if let Some(tenant) = self.context.tenant_id() {
            return Ok(tenant.to_string());
        }
        let tenants = self.client.list_tenants().await.context("Failed to load tenants")?;
        let tenant = self
            .context
            .resolve_tenant(&tenants)?
            .ok_or_else(|| anyhow!("No tenants available"))?;
        info!("No tenant selected, using {}", tenant.name);
        Ok(tenant.tenant_id.clone())
    }

    async fn query(&mut self, cli: &Cli, game: Option<&str>) -> Result<AnalyticsQuery> {
        let tenant_id = self.tenant_id(cli.tenant.as_deref()).await?;
        let mut query = AnalyticsQuery::new(tenant_id);
        let today = Local::now().date_naive();
        query = match (cli.from, cli.to) {
            (Some(from), Some(to)) => query.with_range(from, to),
            (Some(from), None) => query.with_range(from, today),
            (None, Some(to)) => query.last_days(to, self.config.display.default_range_days)?,
            (None, None) => query.last_days(today, self.config.display.default_range_days)?,
        };
        if let Some(game) = game {
            query = query.with_game(game);
        }
        Ok(query)
    }

    async fn cards(&self, cards: &[StatCard]) -> Result<()> {
        let mut stdout = io::stdout();
        animate_cards(cards, self.animation, self.theme, &mut stdout).await?;
        Ok(())
    }

    fn print(&self, text: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    /// Prints the heading, plus the loading/error/empty text when there is
    /// nothing to show. Returns the view when it has data.
    fn panel<'s, T: Emptiness>(&self, title: &str, state: &'s ViewState<T>, empty_text: &str) -> Result<Option<&'s T>> {
        match state {
            ViewState::Ready(view) if !view.is_empty() => {
                self.print(&render_heading(title, self.theme))?;
                Ok(Some(view))
            }
            _ => {
                if let ViewState::Failed(message) = state {
                    error!("{}", message);
                }
                self.print(&render_state(title, state, empty_text, self.theme, |_| String::new()))?;
                Ok(None)
            }
        }
    }

    async fn show_traffic(&self, state: &ViewState<TrafficView>) -> Result<()> {
        if let Some(view) = self.panel("Hub Traffic", state, "No traffic recorded for this period")? {
            self.cards(&view.stat_cards()).await?;
            self.print(&render_chart(&view.chart, self.theme))?;
        }
        Ok(())
    }

    async fn show_engagement(&self, state: &ViewState<EngagementView>) -> Result<()> {
        if let Some(view) = self.panel("Engagement", state, "No engagement data for this game")? {
            self.cards(&view.stat_cards()).await?;
            self.print(&render_chart(&view.chart, self.theme))?;
        }
        Ok(())
    }

    async fn show_performance(&self, state: &ViewState<PerformanceView>) -> Result<()> {
        if let Some(view) = self.panel("Performance", state, "No answers recorded for this period")? {
            self.cards(&view.stat_cards()).await?;
            self.print(&format!("  Accuracy rating: {}\n", view.accuracy_band))?;
            self.print(&render_chart(&view.chart, self.theme))?;
        }
        Ok(())
    }

    async fn show_popularity(&self, state: &ViewState<PopularityView>) -> Result<()> {
        if let Some(view) = self.panel("Popular Games", state, "No games played yet")? {
            self.cards(&view.stat_cards()).await?;
            self.print(&render_rankings(&view.ranking_rows(), self.theme))?;
            self.print(&render_chart(&view.to_chart(BAR_CHART_LIMIT), self.theme))?;
            self.print(&render_chart(&view.distribution_chart(), self.theme))?;
        }
        Ok(())
    }

    async fn show_conversion(&self, state: &ViewState<ConversionView>) -> Result<()> {
        if let Some(view) = self.panel("Conversion Funnel", state, "No hub visits recorded for this period")? {
            self.cards(&view.funnel.stat_cards()).await?;
            self.print(&render_funnel(&view.funnel, self.theme))?;
            self.print(&render_chart(&view.funnel.to_chart(), self.theme))?;
            self.print(&render_chart(&view.funnel.conversion_rates_chart(), self.theme))?;
            if let Some(trend) = &view.trend {
                self.print(&render_chart(trend, self.theme))?;
            }
        }
        Ok(())
    }

    async fn show_reliability(&self, state: &ViewState<ReliabilityView>) -> Result<()> {
        if let Some(view) = self.panel("Reliability", state, "No events recorded for this period")? {
            self.cards(&view.stat_cards()).await?;
            self.print(&format!(
                "  Error rate: {}  Error volume: {}\n",
                view.error_rate_band, view.error_count_band
            ))?;
            self.print(&render_chart(&view.chart, self.theme))?;
        }
        Ok(())
    }

    async fn show_series(&self, title: &str, state: &ViewState<DailySeriesView>) -> Result<()> {
        if let Some(view) = self.panel(title, state, "No data for this period")? {
            self.cards(&view.stat_cards()).await?;
            self.print(&render_chart(&view.chart, self.theme))?;
        }
        Ok(())
    }

    async fn show_overview(&self, overview: &Overview) -> Result<()> {
        self.show_traffic(&overview.traffic).await?;
        if let Some(engagement) = &overview.engagement {
            self.show_engagement(engagement).await?;
        }
        self.show_performance(&overview.performance).await?;
        self.show_popularity(&overview.popularity).await?;
        self.show_conversion(&overview.conversion).await
    }

    async fn tenants(&mut self) -> Result<()> {
        let tenants = self.client.list_tenants().await.context("Failed to load tenants")?;
        if tenants.is_empty() {
            return self.print("No tenants\n");
        }
        let selected = resolve_tenant(&tenants, self.context.tenant_id()).map(|t| t.tenant_id.clone());
        let mut out = render_heading("Tenants", self.theme);
        for tenant in &tenants {
            let marker = if Some(&tenant.tenant_id) == selected.as_ref() { "*" } else { " " };
            out.push_str(&format!("{} {:<38} {}\n", marker, tenant.tenant_id, tenant.name));
        }
        self.print(&out)
    }

    async fn use_tenant(&mut self, tenant_id: &str) -> Result<()> {
        let tenants = self.client.list_tenants().await.context("Failed to load tenants")?;
        let tenant = tenants
            .iter()
            .find(|t| t.tenant_id == tenant_id)
            .ok_or_else(|| anyhow!("Unknown tenant: {}", tenant_id))?;
        self.context.select_tenant(Some(tenant.tenant_id.clone()))?;
        self.print(&format!("Selected tenant {}\n", tenant.name))
    }

    async fn games(&self, command: &GamesCommand) -> Result<()> {
        match command {
            GamesCommand::List { status } => {
                let games = match status {
                    Some(status) => self.client.list_games_by_status(*status).await?,
                    None => self.client.list_games().await?,
                };
                self.print(&format_games(&games, self.theme))
            }
            GamesCommand::Show { game_id } => {
                let game = self.client.get_game(game_id).await?;
                self.print(&format_game(&game))
            }
            GamesCommand::Create {
                title,
                url,
                game_type,
                description,
                status,
            } => {
                let mut request = CreateGameRequest::new(title.as_str(), url.as_str(), *game_type).with_status(*status);
                if let Some(description) = description {
                    request = request.with_description(description.as_str());
                }
                let game = self.client.create_game(&request).await?;
                self.print(&format!("Created {} ({})\n", game.display_title(), game.game_id))
            }
            GamesCommand::Edit {
                game_id,
                title,
                url,
                game_type,
                description,
            } => {
                let update = UpdateGameRequest {
                    title: title.as_ref().map(|t| t.trim().to_string()),
                    description: description.as_ref().map(|d| d.trim().to_string()),
                    game_type: *game_type,
                    url: url.as_ref().map(|u| u.trim().to_string()),
                };
                let game = self.client.update_game(game_id, &update).await?;
                self.print(&format!("Updated {} ({})
", game.display_title(), game.game_id))
            }
            GamesCommand::SetStatus { game_id, status } => {
                let game = self.client.set_game_status(game_id, *status).await?;
                self.print(&format!("{} is now {}\n", game.display_title(), game.status))
            }
            GamesCommand::Delete { game_id } => {
                let ack = self.client.delete_game(game_id).await?;
                let message = ack.message.unwrap_or_else(|| format!("Deleted {}", game_id));
                self.print(&format!("{}\n", message))
            }
        }
    }

    async fn client_games(&mut self, cli: &Cli, command: &ClientGamesCommand) -> Result<()> {
        let tenant_id = self.tenant_id(cli.tenant.as_deref()).await?;
        match command {
            ClientGamesCommand::List => {
                let games = self.client.list_client_games(&tenant_id).await?;
                self.print(&format_client_games(&games, self.theme))
            }
            ClientGamesCommand::Show { game_id } => {
                let games = self.client.list_client_games(&tenant_id).await?;
                let game = games
                    .iter()
                    .find(|g| &g.game_id == game_id)
                    .ok_or_else(|| anyhow!("Game {} is not configured for tenant {}", game_id, tenant_id))?;
                self.print(&format_client_game(game))
            }
            ClientGamesCommand::Hide { game_id, show } => {
                let game = self.client.set_client_game_active(&tenant_id, game_id, *show).await?;
                let state = if game.is_active { "visible" } else { "hidden" };
                self.print(&format!("{} is now {} for tenant {}\n", game.display_title(), state, tenant_id))
            }
            ClientGamesCommand::Edit {
                game_id,
                title,
                description,
            } => {
                let update = ClientGameInfoUpdate {
                    title: title.trim().to_string(),
                    description: description.trim().to_string(),
                };
                let game = self.client.update_client_game_info(&tenant_id, game_id, &update).await?;
                self.print(&format!("Updated {}\n", game.display_title()))
            }
            ClientGamesCommand::Publish => {
                let ack = self.client.publish_client_games(&tenant_id).await?;
                let message = ack
                    .message
                    .unwrap_or_else(|| format!("Published game configuration for {}", tenant_id));
                self.print(&format!("{}\n", message))
            }
        }
    }
}

fn format_games(games: &[Game], theme: Theme) -> String {
    if games.is_empty() {
        return "No games\n".to_string();
    }
    let mut out = render_heading("Games", theme);
    for game in games {
        out.push_str(&format!(
            "  {:<38} {:<32} {:<14} {}\n",
            game.game_id,
            game.display_title(),
            game.game_type,
            game.status
        ));
    }
    out
}

fn format_game(game: &Game) -> String {
    format!(
        "{}\n  id:          {}\n  type:        {}\n  status:      {}\n  url:         {}\n  created:     {}\n  description: {}\n",
        game.display_title(),
        game.game_id,
        game.game_type,
        game.status,
        game.url,
        game.created_at.format("%Y-%m-%d %H:%M"),
        game.description.as_deref().unwrap_or("-")
    )
}

fn format_client_games(games: &[ClientGame], theme: Theme) -> String {
    if games.is_empty() {
        return "No games configured for this tenant\n".to_string();
    }
    let mut out = render_heading("Client Games", theme);
    for game in games {
        out.push_str(&format!(
            "  {:<38} {:<32} {}\n",
            game.game_id,
            game.display_title(),
            if game.is_active { "visible" } else { "hidden" }
        ));
    }
    out
}

fn format_client_game(game: &ClientGame) -> String {
    format!(
        "{}\n  game:        {}\n  tenant:      {}\n  visible:     {}\n  description: {}\n  updated:     {}\n",
        game.display_title(),
        game.game_id,
        game.tenant.as_ref().map(|t| t.name.as_str()).unwrap_or(&game.tenant_id),
        if game.is_active { "yes" } else { "no" },
        game.description.as_deref().unwrap_or("-"),
        game.updated_at
            .unwrap_or(game.created_at)
            .format("%Y-%m-%d %H:%M")
    )
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let client = ApiClient::from_config(&config).context("Failed to build API client")?;
    let context = DashboardContext::load(Box::new(FileStore::new(config.preferences.path.clone())));
    let animation = if cli.no_animate {
        Duration::ZERO
    } else {
        Duration::from_millis(config.display.animation_ms)
    };

    let mut app = App {
        theme: Theme::from_dark_mode(context.dark_mode()),
        service: AnalyticsService::new(client.clone()),
        client,
        context,
        config,
        animation,
    };

    let outcome = match &cli.command {
        Command::Overview { game } => {
            let query = app.query(&cli, game.as_deref()).await?;
            let overview = app.service.overview(&query).await;
            app.show_overview(&overview).await
        }
        Command::Traffic => {
            let query = app.query(&cli, None).await?;
            let state = app.service.traffic(&query).await;
            app.show_traffic(&state).await
        }
        Command::Engagement { game } => {
            let query = app.query(&cli, Some(game.as_str())).await?;
            let state = app.service.engagement(&query).await;
            app.show_engagement(&state).await
        }
        Command::Performance { game } => {
            let query = app.query(&cli, game.as_deref()).await?;
            let state = app.service.performance(&query).await;
            app.show_performance(&state).await
        }
        Command::Popularity { limit } => {
            let query = app.query(&cli, None).await?.with_limit(*limit);
            let state = app.service.popularity(&query).await;
            app.show_popularity(&state).await
        }
        Command::Funnel { game } => {
            let query = app.query(&cli, game.as_deref()).await?;
            let state = app.service.conversion(&query).await;
            app.show_conversion(&state).await
        }
        Command::Reliability => {
            let query = app.query(&cli, None).await?;
            let state = app.service.reliability(&query).await;
            app.show_reliability(&state).await
        }
        Command::Series { kind, game } => {
            let query = app.query(&cli, game.as_deref()).await?;
            let state = app.service.daily_series(*kind, &query).await;
            app.show_series(kind.title(), &state).await
        }
        Command::Tenants => app.tenants().await,
        Command::UseTenant { tenant_id } => app.use_tenant(tenant_id).await,
        Command::Theme(args) => {
            let dark = args.dark && !args.light;
            app.context.set_dark_mode(dark)?;
            app.print(if dark { "Dark mode on\n" } else { "Dark mode off\n" })
        }
        Command::Games(command) => app.games(command).await,
        Command::ClientGames(command) => app.client_games(&cli, command).await,
        Command::Health => {
            let health = app.client.health().await.context("Backend is unreachable")?;
            app.print(&format!("{} {}\n", app.client.base_url(), health.status))
        }
    };

    let stats = app.client.cache().stats().await;
    debug!(
        "Request cache: {} entries, {} hits, {} misses ({:.0}% hit rate)",
        stats.total_entries,
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0
    );
    outcome
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));

    let cli = Cli::parse();
    if let (Some(from), Some(to)) = (cli.from, cli.to) {
        if from > to {
            bail!("--from {} is after --to {}", from, to);
        }
    }

    run(cli).await
}
