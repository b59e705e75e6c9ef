#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use serde::Serialize;

use revarchive::config::{Config, DEFAULT_DIRECTORY};
use revarchive::export::DEFAULT_SOURCE;
use revarchive::user_state::AlbumState;
use revarchive::{
    logger, AlbumDetail, AlbumFilter, Archive, Flag, Result, Scope, REVARCHIVE_VERSION,
};

fn scope_args<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    vec![
        Arg::with_name("scope")
            .long("scope")
            .help("Album scope")
            .possible_values(&["all", "listened"])
            .default_value("all"),
        Arg::with_name("favorites")
            .long("favorites")
            .help("Only favorites"),
        Arg::with_name("wishlist")
            .long("wishlist")
            .help("Only wishlist"),
    ]
}

fn id_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("id")
        .help("Album id")
        .required(true)
        .index(1)
}

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("revarchive")
        .version(REVARCHIVE_VERSION)
        .about("Personal music review archive")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("directory")
                .long("directory")
                .help("Database directory")
                .takes_value(true)
                .default_value(DEFAULT_DIRECTORY),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("More logging, repeat for trace"),
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("List albums in scope")
                .args(&scope_args())
                .arg(Arg::with_name("json").long("json").help("Print JSON")),
        )
        .subcommand(
            SubCommand::with_name("show")
                .about("Show an album")
                .arg(id_arg())
                .arg(Arg::with_name("json").long("json").help("Print JSON")),
        )
        .subcommand(
            SubCommand::with_name("open")
                .about("Show an album and remember it as the last one")
                .arg(id_arg()),
        )
        .subcommand(
            SubCommand::with_name("state")
                .about("Show listened/favorite/wishlist flags")
                .arg(id_arg()),
        )
        .subcommand(
            SubCommand::with_name("toggle")
                .about("Flip one flag of an album")
                .arg(id_arg())
                .arg(
                    Arg::with_name("flag")
                        .required(true)
                        .index(2)
                        .possible_values(&["listened", "favorite", "wishlist"]),
                ),
        )
        .subcommand(
            SubCommand::with_name("next")
                .about("Next album by id within scope")
                .arg(id_arg())
                .args(&scope_args()),
        )
        .subcommand(
            SubCommand::with_name("prev")
                .about("Previous album by id within scope")
                .arg(id_arg())
                .args(&scope_args()),
        )
        .subcommand(
            SubCommand::with_name("random")
                .about("Open a random album within scope")
                .args(&scope_args()),
        )
        .subcommand(SubCommand::with_name("last").about("Show the last opened album"))
        .subcommand(
            SubCommand::with_name("links")
                .about("List links of an album")
                .arg(id_arg()),
        )
        .subcommand(
            SubCommand::with_name("add-link")
                .about("Add a link unless one from the same source exists")
                .arg(id_arg())
                .arg(Arg::with_name("source").required(true).index(2))
                .arg(Arg::with_name("url").required(true).index(3)),
        )
        .subcommand(
            SubCommand::with_name("random-mode")
                .about("Show or set the random mode setting")
                .arg(
                    Arg::with_name("mode")
                        .index(1)
                        .possible_values(&["on", "off"]),
                ),
        )
        .subcommand(
            SubCommand::with_name("import")
                .about("Import review records from a JSON file")
                .arg(Arg::with_name("file").required(true).index(1)),
        )
        .subcommand(
            SubCommand::with_name("generate-links")
                .about("Add YouTube search links to albums lacking one"),
        )
        .subcommand(
            SubCommand::with_name("export")
                .about("Export album metadata as text")
                .arg(Arg::with_name("file").index(1))
                .arg(
                    Arg::with_name("source")
                        .long("source")
                        .takes_value(true)
                        .default_value(DEFAULT_SOURCE),
                ),
        )
        .subcommand(
            SubCommand::with_name("delete")
                .about("Delete an album with its reviews and links")
                .arg(id_arg()),
        )
}

fn scope_of(m: &ArgMatches) -> Result<(Scope, AlbumFilter)> {
    let scope: Scope = m.value_of("scope").unwrap_or("all").parse()?;
    let filter = AlbumFilter::new(m.is_present("favorites"), m.is_present("wishlist"));

    Ok((scope, filter))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn flag_mark(value: bool) -> &'static str {
    if value {
        "x"
    } else {
        " "
    }
}

fn print_state(state: &AlbumState) {
    println!(
        "[{}] listened  [{}] favorite  [{}] wishlist",
        flag_mark(state.listened),
        flag_mark(state.favorite),
        flag_mark(state.wishlist)
    );
}

fn print_detail(detail: &AlbumDetail, state: &AlbumState) {
    let album = &detail.album;

    match album.year {
        Some(year) => println!("{} - {} ({})", detail.artist_name(), album.title, year),
        None => println!("{} - {}", detail.artist_name(), album.title),
    }

    if let Some(label) = &album.label {
        println!("Label: {}", label);
    }
    if let Some(genre) = &album.genre {
        println!("Genre: {}", genre);
    }
    if let Some(cover_url) = &album.cover_url {
        println!("Cover: {}", cover_url);
    }

    print_state(state);

    if detail.reviews.is_empty() {
        println!("\nNo reviews.");
    }

    for review in &detail.reviews {
        println!();

        let mut meta: Vec<String> = Vec::new();
        if let Some(author) = &review.author {
            meta.push(author.clone());
        }
        if let Some(published_at) = review.published_at {
            meta.push(published_at.format("%F").to_string());
        }
        if let Some(rating) = review.rating {
            meta.push(format!("{}/5", rating));
        }
        if !meta.is_empty() {
            println!("== {}", meta.join(", "));
        }

        for paragraph in review.paragraphs() {
            println!("{}\n", paragraph);
        }
    }
}

fn show_album(archive: &Archive, config: &Config, detail: Option<AlbumDetail>) -> Result<()> {
    match detail {
        Some(detail) => {
            let state = archive.get_state(config.user, detail.album.album_id)?;
            print_detail(&detail, &state);
        }
        None => println!("Album not found."),
    }

    Ok(())
}

fn run(matches: &ArgMatches, config: &Config) -> Result<()> {
    std::fs::create_dir_all(config.directory())?;

    let archive = Archive::open(config.db_path())?;
    let user = config.user;

    match matches.subcommand() {
        ("list", Some(m)) => {
            let (scope, filter) = scope_of(m)?;
            let entries = archive.list_for_scope(user, scope, filter)?;

            if m.is_present("json") {
                return print_json(&entries);
            }

            if entries.is_empty() {
                println!("No albums in this scope.");
            }
            for entry in &entries {
                println!(
                    "{:>6}  {} - {}",
                    entry.album.album_id, entry.artist.name, entry.album.title
                );
            }
        }
        ("show", Some(m)) => {
            let album_id = value_t_or_exit!(m, "id", i64);
            let detail = archive.get_album(album_id)?;

            if m.is_present("json") {
                return print_json(&detail);
            }
            show_album(&archive, config, detail)?;
        }
        ("open", Some(m)) => {
            let album_id = value_t_or_exit!(m, "id", i64);
            let detail = archive.get_album(album_id)?;

            if detail.is_some() {
                archive.set_last(user, album_id)?;
            }
            show_album(&archive, config, detail)?;
        }
        ("state", Some(m)) => {
            let album_id = value_t_or_exit!(m, "id", i64);
            print_state(&archive.get_state(user, album_id)?);
        }
        ("toggle", Some(m)) => {
            let album_id = value_t_or_exit!(m, "id", i64);
            let flag: Flag = m.value_of("flag").unwrap_or_default().parse()?;
            let value = archive.toggle(user, album_id, flag)?;
            println!("{} = {}", flag, value as i64);
        }
        ("next", Some(m)) | ("prev", Some(m)) => {
            let album_id = value_t_or_exit!(m, "id", i64);
            let (scope, filter) = scope_of(m)?;

            let album = if matches.subcommand_name() == Some("next") {
                archive.get_next(user, album_id, scope, filter)?
            } else {
                archive.get_prev(user, album_id, scope, filter)?
            };

            match album {
                Some(album) => {
                    archive.set_last(user, album.album_id)?;
                    let detail = archive.get_album(album.album_id)?;
                    show_album(&archive, config, detail)?;
                }
                None => println!("No album in that direction."),
            }
        }
        ("random", Some(m)) => {
            let (scope, filter) = scope_of(m)?;

            match archive.get_random(user, scope, filter)? {
                Some(detail) => {
                    archive.set_last(user, detail.album.album_id)?;
                    show_album(&archive, config, Some(detail))?;
                }
                None => println!("No albums in this scope."),
            }
        }
        ("last", Some(_)) => match archive.get_last(user)? {
            Some(detail) => show_album(&archive, config, Some(detail))?,
            None => println!("No last album."),
        },
        ("links", Some(m)) => {
            let album_id = value_t_or_exit!(m, "id", i64);
            for link in archive.get_links(album_id)? {
                println!("{}: {}", link.source, link.url);
            }
        }
        ("add-link", Some(m)) => {
            let album_id = value_t_or_exit!(m, "id", i64);
            let source = m.value_of("source").unwrap_or_default();
            let url = m.value_of("url").unwrap_or_default();

            if archive.add_link(album_id, source, url)? {
                println!("Added {} link.", source);
            } else {
                println!("Album already has a {} link.", source);
            }
        }
        ("random-mode", Some(m)) => {
            if let Some(mode) = m.value_of("mode") {
                archive.set_random_mode(user, mode == "on")?;
            }
            let enabled = archive.random_mode(user)?;
            println!("random mode {}", if enabled { "on" } else { "off" });
        }
        ("import", Some(m)) => {
            let path = Path::new(m.value_of("file").unwrap_or_default());
            let stats = archive.import_file(path)?;
            print_json(&stats)?;
        }
        ("generate-links", Some(_)) => {
            let stats = archive.generate_search_links()?;
            println!("Created {} youtube_search links.", stats.created);
            println!("Skipped {} albums without artist/title.", stats.skipped_missing);
        }
        ("export", Some(m)) => {
            let source = m.value_of("source").unwrap_or(DEFAULT_SOURCE);

            match m.value_of("file") {
                Some(file) => {
                    let mut out = BufWriter::new(File::create(file)?);
                    archive.export_metadata(source, &mut out)?;
                }
                None => {
                    archive.export_metadata(source, &mut io::stdout().lock())?;
                }
            }
        }
        ("delete", Some(m)) => {
            let album_id = value_t_or_exit!(m, "id", i64);
            if archive.delete_album(album_id)? {
                println!("Deleted album {}.", album_id);
            } else {
                println!("Album not found.");
            }
        }
        _ => unreachable!("subcommand required"),
    }

    Ok(())
}

fn main() {
    let matches = app().get_matches();
    let config = Config::from_matches(&matches);

    logger::init(config.log_level);

    debug!("{} {:?}", REVARCHIVE_VERSION, config);

    if let Err(e) = run(&matches, &config) {
        error!("{}", e);
        std::process::exit(1);
    }
}
