//! Headless mode.
//!
//! A line-oriented protocol over stdin/stdout for scripted runs and agents:
//! plain lines are player commands, lines starting with `#` are meta
//! commands.

use std::io::{self, BufRead, Write};

use tta_core::{EntityFilter, GameSession, RestoreOutcome};

use crate::commands::ConsoleCommand;

/// Run the session until stdin closes or `#quit` is read.
pub async fn run_headless(mut session: GameSession) -> io::Result<()> {
    println!("=== Text Adventure Console (headless) ===");
    println!("Engine: {}  Branch: {}", session.engine_name(), session.current_branch());
    print_status(&session);
    println!();
    println!("Enter commands one per line. Type #help for meta commands.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(meta) = line.strip_prefix('#') {
            match ConsoleCommand::parse(meta) {
                Ok(ConsoleCommand::Quit) => {
                    println!("Goodbye!");
                    break;
                }
                Ok(command) => run_command(&mut session, command),
                Err(message) => println!("[ERROR] {message}. Type #help for help."),
            }
            stdout.flush()?;
            continue;
        }

        print!("[PROCESSING]");
        stdout.flush()?;

        let result = session.submit(line).await;
        print!("\r            \r");

        match result {
            Ok(response) => {
                println!("[NARRATIVE]");
                println!("{}", response.narrative);
                if !response.trace.is_empty() {
                    println!("[TRACE]");
                    println!("{}", response.trace);
                }
                for id in &response.new_nodes {
                    println!("[NODE] {} ({id})", session.graph().label_of(id));
                }
                println!(
                    "[COMMIT] {} {}",
                    response.commit.short(),
                    response.commit_message
                );
                println!();
            }
            Err(e) => println!("[ERROR] {e}"),
        }
        stdout.flush()?;
    }

    Ok(())
}

fn run_command(session: &mut GameSession, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Status => print_status(session),
        ConsoleCommand::Log => print_log(session),
        ConsoleCommand::Graph => print_graph(session),
        ConsoleCommand::Entities { kind, search } => {
            print_entities(session, &EntityFilter { kind, search })
        }
        ConsoleCommand::Type(kind) => print_entities(
            session,
            &EntityFilter {
                kind,
                search: String::new(),
            },
        ),
        ConsoleCommand::Search(search) => {
            print_entities(session, &EntityFilter { kind: None, search })
        }
        ConsoleCommand::Fork(name) => match session.fork(name.as_deref()) {
            Ok(commit) => println!("[FORK] {} {}", commit.hash.short(), commit.message),
            Err(e) => println!("[ERROR] {e}"),
        },
        ConsoleCommand::Restore(hash) => match session.restore(&hash) {
            Ok(RestoreOutcome::Restored) => {
                if let Some(active) = session.commits().active() {
                    println!("[RESTORE] {} {}", active.hash.short(), active.message);
                }
                print_status(session);
            }
            Ok(RestoreOutcome::Skipped) => {
                println!("[RESTORE] Commit has no snapshot; nothing restored")
            }
            Err(e) => println!("[ERROR] {e}"),
        },
        ConsoleCommand::New => match session.create_node() {
            Ok(id) => println!("[DB] Inserted {id}"),
            Err(e) => println!("[ERROR] {e}"),
        },
        ConsoleCommand::Delete(id) => match session.delete_node(&id) {
            Ok(links) => println!("[DB] Deleted {id} ({links} links)"),
            Err(e) => println!("[ERROR] {e}"),
        },
        ConsoleCommand::Edit { id, json } => match session.patch_entity(&id, &json) {
            Ok(()) => println!("[DB] Patched {id}"),
            Err(e) => println!("[ERROR] {e}"),
        },
        ConsoleCommand::Save { id, content } => match session.save_file(&id, &content) {
            Ok(()) => println!("[FILE] Saved {id}"),
            Err(e) => println!("[ERROR] {e}"),
        },
        ConsoleCommand::Files => print_files(session),
        ConsoleCommand::Help => print_help(),
        ConsoleCommand::Quit => {}
    }
}

fn print_status(session: &GameSession) {
    let state = session.state();
    println!("[STATUS]");
    println!("  HP: {}/{}", state.hp, state.max_hp);
    println!("  Location: {}", state.location);
    println!("  Inventory: {}", state.inventory.join(", "));
    let branch = session.current_branch();
    let on_branch = session.commits().on_branch(branch).count();
    println!("  Branch: {branch} ({on_branch} commits)");
    if let Some(active) = session.commits().active() {
        println!("  Commit: {} {}", active.hash.short(), active.message);
    }
}

fn print_log(session: &GameSession) {
    println!("[LOG]");
    println!("  Branches: {}", session.commits().branches().join(", "));
    for commit in session.commits().history() {
        let marker = if commit.active { "*" } else { " " };
        println!(
            "{marker} {} [{}] {} {}",
            commit.hash.short(),
            commit.branch,
            commit.timestamp,
            commit.message
        );
    }
}

fn print_graph(session: &GameSession) {
    let graph = session.graph();
    println!("[GRAPH]");
    for node in graph.nodes() {
        println!("  {} ({}, {})", node.label, node.kind, node.id);
    }
    for link in graph.links() {
        println!(
            "  {} --{}--> {}",
            graph.label_of(&link.source),
            link.label,
            graph.label_of(&link.target)
        );
    }
}

fn print_entities(session: &GameSession, filter: &EntityFilter) {
    println!("[ENTITIES]");
    for node in session.graph().filter(filter) {
        println!(
            "  {:<18} {:<20} {:<10} {}",
            node.id,
            node.label,
            node.kind.name(),
            serde_json::Value::Object(node.data.clone())
        );
    }
}

fn print_files(session: &GameSession) {
    println!("[FILES]");
    for (depth, node) in session.files().outline() {
        println!("{:indent$}{} ({})", "", node.name, node.id, indent = 2 + depth * 2);
    }
}

fn print_help() {
    println!("[HELP]");
    println!("  #status                 current state and commit");
    println!("  #log                    commit history, newest first");
    println!("  #graph                  knowledge graph");
    println!("  #entities [type] [text] entity table, filtered");
    println!("  #fork [name]            start a branch");
    println!("  #restore <hash>         time travel to a commit");
    println!("  #new                    insert a blank entity");
    println!("  #delete <id>            delete an entity and its links");
    println!("  #edit <id> <json>       replace an entity's data");
    println!("  #files                  project files");
    println!("  #save <id> <content>    overwrite a project file");
    println!("  #quit                   exit");
    println!("  (anything else is sent as a player command)");
}

