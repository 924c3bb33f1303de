use clap::{Args, Parser, Subcommand};

use crate::entity::ResourceType;
use crate::feed::PostFilter;

#[derive(Parser, Debug)]
#[command(name = "devfeed")]
#[command(version, about = "A community feed for developers, in your terminal")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log backend calls and state changes to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new devfeed project in the current directory
    Init,

    /// Create an account and sign in
    Signup {
        /// Display name shown on posts and comments
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign in to an existing account
    Login {
        #[arg(long)]
        email: String,

        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// End the current session
    Logout,

    /// Show the signed-in user
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show whether a page would render or redirect for the current session
    Route {
        /// Page path, e.g. "/dashboard"
        path: String,
    },

    /// Show the feed
    Feed {
        /// Which posts to show (trending, recent)
        #[arg(long, short = 'f', default_value = "trending")]
        filter: PostFilter,

        /// Expand the comments of a post (can be specified multiple times)
        #[arg(long = "expand", short = 'x', value_name = "ID")]
        expand: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Publish a post
    Post {
        /// Post title
        title: String,

        /// Post body
        #[arg(long, short = 'c', conflicts_with = "stdin")]
        content: Option<String>,

        /// Read the body from stdin
        #[arg(long)]
        stdin: bool,
    },

    /// Like a post
    Like {
        /// Post ID or unique prefix
        id: String,
    },

    /// Comment on a post
    Comment {
        /// Post ID or unique prefix
        id: String,

        /// Comment text
        text: String,
    },

    /// Share a post
    Share {
        /// Post ID or unique prefix
        id: String,
    },

    /// List shared resources
    Resources {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage shared resources
    Resource(ResourceCommand),

    /// Open an interactive dashboard session
    Dashboard,
}

#[derive(Args, Debug)]
pub struct ResourceCommand {
    #[command(subcommand)]
    pub action: ResourceAction,
}

#[derive(Subcommand, Debug)]
pub enum ResourceAction {
    /// Share a link, PDF or video
    Add {
        title: String,

        /// http:// or https:// address
        url: String,

        /// Resource type (link, pdf, video)
        #[arg(long = "type", short = 't', default_value = "link")]
        kind: ResourceType,

        #[arg(long, short = 'd')]
        description: Option<String>,
    },
}
