mod commands;
mod handlers;
mod render;

pub use commands::{Cli, Commands, ResourceAction, ResourceCommand};
pub use handlers::{
    handle_comment, handle_dashboard, handle_feed, handle_init, handle_like, handle_login,
    handle_logout, handle_post, handle_resource_add, handle_resources, handle_route, handle_share,
    handle_signup, handle_whoami,
};
