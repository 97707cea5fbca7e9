use clap::{Parser, Subcommand};
use social_client::{NewUser, SocialClient, UserUpdate};

#[derive(Parser, Debug)]
#[command(name = "social", about = "Command line client for the social API")]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Where the bearer token is kept between runs.
    #[arg(long, default_value = ".social_token")]
    token_file: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        nick: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    User {
        id: i64,
    },
    Search {
        term: String,
    },
    UpdateUser {
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        nick: String,
        #[arg(long)]
        email: Option<String>,
    },
    DeleteUser {
        id: i64,
    },
    ChangePassword {
        id: i64,
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
    },
    Follow {
        id: i64,
    },
    Unfollow {
        id: i64,
    },
    Followers {
        id: i64,
    },
    Following {
        id: i64,
    },
    Posts,
    Post {
        id: i64,
    },
    CreatePost {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    UpdatePost {
        id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    DeletePost {
        id: i64,
    },
    Like {
        id: i64,
    },
    Unlike {
        id: i64,
    },
    Comment {
        post_id: i64,
        content: String,
    },
    Comments {
        post_id: i64,
    },
    DeleteComment {
        id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let mut client = SocialClient::new(&args.server)?.with_token_file(&args.token_file)?;

    match args.command {
        Command::Register {
            name,
            nick,
            email,
            password,
        } => {
            let user = client
                .register(&NewUser {
                    name: &name,
                    nick: &nick,
                    email: &email,
                    password: &password,
                })
                .await?;
            println!("Registered {user}");
        }
        Command::Login { email, password } => {
            let token = client.login(&email, &password).await?;
            println!("Logged in, token valid for {}h", token.expires_in / 3600);
        }
        Command::Logout => {
            client.logout()?;
            println!("Logged out");
        }
        Command::User { id } => println!("{}", client.user(id).await?),
        Command::Search { term } => {
            let users = client.search(&term).await?;
            if users.is_empty() {
                println!("No users found");
            }
            for user in users {
                println!("{user}");
            }
        }
        Command::UpdateUser {
            id,
            name,
            nick,
            email,
        } => {
            let user = client
                .update_user(
                    id,
                    &UserUpdate {
                        name: &name,
                        nick: &nick,
                        email: email.as_deref(),
                    },
                )
                .await?;
            println!("Updated {user}");
        }
        Command::DeleteUser { id } => {
            client.delete_user(id).await?;
            client.logout()?;
            println!("Account deleted");
        }
        Command::ChangePassword { id, old, new } => {
            println!("{}", client.change_password(id, &old, &new).await?);
        }
        Command::Follow { id } => println!("{}", client.follow(id).await?),
        Command::Unfollow { id } => println!("{}", client.unfollow(id).await?),
        Command::Followers { id } => {
            let users = client.followers(id).await?;
            println!("Followers ({})", users.len());
            for user in users {
                println!("- {user}");
            }
        }
        Command::Following { id } => {
            let users = client.following(id).await?;
            println!("Following ({})", users.len());
            for user in users {
                println!("- {user}");
            }
        }
        Command::Posts => {
            let posts = client.posts().await?;
            println!("Posts ({})", posts.len());
            for post in posts {
                println!("{post}\n");
            }
        }
        Command::Post { id } => println!("{}", client.post(id).await?),
        Command::CreatePost { title, content } => {
            let post = client.create_post(&title, &content).await?;
            println!("Post created! ID: {}", post.id);
        }
        Command::UpdatePost { id, title, content } => {
            let post = client.update_post(id, &title, &content).await?;
            println!("Post updated:\n{post}");
        }
        Command::DeletePost { id } => println!("{}", client.delete_post(id).await?),
        Command::Like { id } => println!("{}", client.like(id).await?),
        Command::Unlike { id } => println!("{}", client.unlike(id).await?),
        Command::Comment { post_id, content } => {
            let comment = client.comment(post_id, &content).await?;
            println!("Comment added! ID: {}", comment.id);
        }
        Command::Comments { post_id } => {
            for comment in client.comments(post_id).await? {
                println!("{comment}");
            }
        }
        Command::DeleteComment { id } => println!("{}", client.delete_comment(id).await?),
    }

    Ok(())
}
