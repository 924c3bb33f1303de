use clap::Parser;
use devfeed::cli::{
    handle_comment, handle_dashboard, handle_feed, handle_init, handle_like, handle_login,
    handle_logout, handle_post, handle_resource_add, handle_resources, handle_route, handle_share,
    handle_signup, handle_whoami, Cli, Commands, ResourceAction,
};
use devfeed::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Init => handle_init().await,
        Commands::Signup {
            name,
            email,
            password,
        } => handle_signup(name, email, password).await,
        Commands::Login { email, password } => handle_login(email, password).await,
        Commands::Logout => handle_logout().await,
        Commands::Whoami { json } => handle_whoami(json).await,
        Commands::Route { path } => handle_route(path).await,
        Commands::Feed {
            filter,
            expand,
            json,
        } => handle_feed(filter, expand, json).await,
        Commands::Post {
            title,
            content,
            stdin,
        } => handle_post(title, content, stdin).await,
        Commands::Like { id } => handle_like(id).await,
        Commands::Comment { id, text } => handle_comment(id, text).await,
        Commands::Share { id } => handle_share(id).await,
        Commands::Resources { json } => handle_resources(json).await,
        Commands::Resource(resource_cmd) => match resource_cmd.action {
            ResourceAction::Add {
                title,
                url,
                kind,
                description,
            } => handle_resource_add(title, url, kind, description).await,
        },
        Commands::Dashboard => handle_dashboard().await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
