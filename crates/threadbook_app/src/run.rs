//! Orchestrates one invocation: load inputs once, then build every selected
//! profile in isolation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use book_logging::{book_error, book_info, book_warn};
use chrono::Utc;
use threadbook_core::{collect_image_sources, BookBuilder, BookPlan, BuildProfile, Corpus};
use threadbook_engine::{
    load_corpus, write_package, AvatarDirectory, FetchSettings, ImageCache, LogProgressSink, PackageAssets,
    PackageSummary, PackageTarget, ReqwestFetcher,
};

use crate::cli::Args;
use crate::config::{load_plan, select_profiles};

#[derive(Debug, Default)]
pub struct RunReport {
    pub built: Vec<(String, PackageSummary)>,
    pub failed: Vec<String>,
}

struct Inputs {
    corpus: Corpus,
    plan: BookPlan,
    cache: ImageCache,
    avatars: AvatarDirectory,
}

pub fn run(args: &Args) -> Result<RunReport> {
    let started = Utc::now();
    let inputs = load_inputs(args)?;
    let profiles = select_profiles(&inputs.plan, &args.profiles)?;

    let mut report = RunReport::default();
    for profile in &profiles {
        book_info!("Building profile '{}'", profile.name);
        match build_profile(args, &inputs, profile) {
            Ok(summary) => report.built.push((profile.name.clone(), summary)),
            Err(err) => {
                book_error!("Profile '{}' failed: {:#}", profile.name, err);
                report.failed.push(profile.name.clone());
            }
        }
    }

    book_info!(
        "Finished {} profiles ({} failed) in {} ms",
        profiles.len(),
        report.failed.len(),
        (Utc::now() - started).num_milliseconds()
    );
    Ok(report)
}

fn load_inputs(args: &Args) -> Result<Inputs> {
    let corpus =
        load_corpus(&args.corpus).with_context(|| format!("loading corpus from {}", args.corpus.display()))?;
    let plan = load_plan(&args.plan)?;
    let cache = ImageCache::open(&args.image_cache)
        .with_context(|| format!("opening image cache {}", args.image_cache.display()))?;

    if args.offline {
        book_info!("Offline: using cached images only");
    } else {
        precache_images(&corpus, &cache)?;
    }

    let avatars = match &args.avatars {
        Some(dir) => AvatarDirectory::scan(dir).with_context(|| format!("scanning avatars in {}", dir.display()))?,
        None => AvatarDirectory::default(),
    };

    Ok(Inputs {
        corpus,
        plan,
        cache,
        avatars,
    })
}

fn precache_images(corpus: &Corpus, cache: &ImageCache) -> Result<()> {
    let sources: Vec<String> = corpus
        .posts()
        .flat_map(|post| collect_image_sources(post.content()))
        .collect();
    let settings = FetchSettings::default();
    let concurrency = settings.concurrency;
    let fetcher = ReqwestFetcher::new(settings);
    let report = cache
        .precache(&sources, &fetcher, &LogProgressSink, concurrency)
        .context("precaching images")?;
    for (source, kind) in &report.failed {
        book_warn!("Image {} stays external: {}", source, kind);
    }
    Ok(())
}

fn build_profile(args: &Args, inputs: &Inputs, profile: &BuildProfile) -> Result<PackageSummary> {
    let book = BookBuilder::new(&inputs.corpus, &inputs.plan, &profile.options)
        .build(&inputs.cache, &inputs.avatars)
        .with_context(|| format!("building profile '{}'", profile.name))?;
    book.diagnostics.log_summary(&profile.name);

    let path: PathBuf = args.out.join(&profile.output);
    let target = if profile.archive {
        PackageTarget::Archive(path)
    } else {
        PackageTarget::Directory(path)
    };
    let assets = PackageAssets {
        image_dir: inputs.cache.dir().to_path_buf(),
        avatar_dir: args.avatars.clone(),
        cover: args.cover.clone(),
    };
    write_package(&book, &inputs.plan.metadata, &assets, &target)
        .with_context(|| format!("writing {}", target.path().display()))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use clap::Parser;

    use super::*;

    const POST: &str = r#"{"Ok": {"id": 7, "subject": "sandbox", "description": "",
        "created_at": "2022-03-14T12:00:00Z", "num_replies": "1", "content": "<p>Start.</p>",
        "character": {"id": 1, "name": "Keltham"}, "icon": {}, "user": {"id": 2, "username": "author"}}}"#;

    const REPLIES: &str = r#"{"Ok": [{"id": 70, "content": "<p>Reply.</p>",
        "created_at": "2022-03-14T12:01:00Z", "updated_at": "2022-03-14T12:01:00Z",
        "character": {"id": 1, "name": "Keltham"}, "character_name": "Keltham", "icon": {},
        "user": {"id": 2, "username": "author"}}]}"#;

    const PLAN: &str = r#"(
        metadata: (title: "Sandbox", language: "en", identifier: "urn:uuid:x"),
        chapters: [(key: "1", thread: 7, slice: Until(marker: 70, inclusive: true))],
        profiles: [
            (name: "ok", output: "ok.epub"),
            (name: "broken", output: "broken.epub", options: (only_main_story: true)),
            (name: "loose", output: "loose", archive: false),
        ],
    )"#;

    fn setup(root: &Path, plan: &str) -> Args {
        let thread = root.join("corpus").join("posts").join("7");
        fs::create_dir_all(&thread).unwrap();
        fs::write(thread.join("post.json"), POST).unwrap();
        fs::write(thread.join("replies.json"), REPLIES).unwrap();
        fs::write(root.join("book.ron"), plan).unwrap();
        let arg = |p: &str| root.join(p).display().to_string();
        Args::try_parse_from([
            "threadbook".to_string(),
            "--corpus".to_string(),
            arg("corpus"),
            "--plan".to_string(),
            arg("book.ron"),
            "--out".to_string(),
            arg("out"),
            "--image-cache".to_string(),
            arg("cache"),
            "--offline".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn every_profile_is_built_into_the_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let args = setup(dir.path(), PLAN);

        let report = run(&Args {
            profiles: vec!["ok".into(), "loose".into()],
            ..args
        })
        .unwrap();

        assert!(report.failed.is_empty());
        assert_eq!(report.built.len(), 2);
        assert!(dir.path().join("out").join("ok.epub").is_file());
        assert!(dir.path().join("out").join("loose").join("mimetype").is_file());
    }

    #[test]
    fn a_failing_profile_does_not_stop_the_others() {
        let dir = tempfile::tempdir().unwrap();
        // The second chapter repeats the first, so every profile fails its
        // cross-check except the one where it is inactive.
        let plan = PLAN.replace(
            r#"chapters: [(key: "1", thread: 7, slice: Until(marker: 70, inclusive: true))]"#,
            r#"chapters: [
                (key: "1", thread: 7, slice: Until(marker: 70, inclusive: true)),
                (key: "2", thread: 7, when: [MainStory]),
            ]"#,
        );
        let args = setup(dir.path(), &plan);

        let report = run(&args).unwrap();

        assert_eq!(report.failed, vec!["broken".to_string()]);
        let built: Vec<&str> = report.built.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(built, vec!["ok", "loose"]);
        assert!(!dir.path().join("out").join("broken.epub").exists());
    }

    #[test]
    fn missing_corpus_fails_the_whole_run() {
        let dir = tempfile::tempdir().unwrap();
        let args = setup(dir.path(), PLAN);

        let err = run(&Args {
            corpus: dir.path().join("nowhere"),
            ..args
        })
        .unwrap_err();

        assert!(format!("{err:#}").contains("loading corpus"));
    }
}
