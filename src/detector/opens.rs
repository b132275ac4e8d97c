// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025-2026 JR Morton

//! File-open generalization.
//!
//! Three passes over the batch: prime the analyzer with every path so the
//! trie reaches its final collapsed shape, generalize each open against
//! that shape and merge flags for opens that land on the same pattern, then
//! run the surviving entries through the analyzer once more so patterns
//! produced by the second pass get a chance to merge with each other.
//!
//! Paths listed in the SBOM set are protected: they pass through verbatim
//! no matter what the trie says. An absent SBOM set behaves as an empty
//! one.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::profile::OpenCall;

use super::PathAnalyzer;

/// Bucket key for the file-open observation trie.
const OPENS_IDENTIFIER: &str = "opens";

/// Generalize a batch of file opens. Output is sorted by path; every
/// entry's flags are sorted and deduplicated.
pub fn analyze_opens(
    opens: &[OpenCall],
    analyzer: &mut PathAnalyzer,
    sbom_set: Option<&HashSet<String>>,
) -> Vec<OpenCall> {
    if opens.is_empty() {
        return Vec::new();
    }
    let empty = HashSet::new();
    let sbom = sbom_set.unwrap_or(&empty);

    // pass 1: prime the trie with the full batch
    for open in opens {
        analyzer.analyze_path(&open.path, OPENS_IDENTIFIER);
    }

    // pass 2: generalize against the primed trie, merging flags on collision
    let mut merged: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for open in opens {
        let target = if sbom.contains(&open.path) {
            open.path.clone()
        } else {
            analyzer.analyze_path(&open.path, OPENS_IDENTIFIER)
        };
        merged.entry(target).or_default().extend(open.flags.iter().cloned());
    }

    // pass 3: reconsolidate entries the trie now recognizes as one pattern
    let mut consolidated: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (path, flags) in merged {
        let target = if sbom.contains(&path) {
            path
        } else {
            analyzer.analyze_path(&path, OPENS_IDENTIFIER)
        };
        consolidated.entry(target).or_default().extend(flags);
    }

    consolidated
        .into_iter()
        .map(|(path, flags)| OpenCall { path, flags: flags.into_iter().collect() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{CollapseConfig, OPEN_DYNAMIC_THRESHOLD};

    fn open(path: &str, flags: &[&str]) -> OpenCall {
        OpenCall {
            path: path.to_string(),
            flags: flags.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn generate_opens(prefix: &str, filename: &str, n: usize) -> Vec<OpenCall> {
        let all_flags = ["READ", "WRITE", "APPEND"];
        (0..n)
            .map(|i| open(&format!("{prefix}/user{i}/{filename}"), &[all_flags[i % 3]]))
            .collect()
    }

    fn paths(result: &[OpenCall]) -> Vec<&str> {
        result.iter().map(|o| o.path.as_str()).collect()
    }

    #[test]
    fn test_collapse_past_default_threshold() {
        let threshold = OPEN_DYNAMIC_THRESHOLD;
        let mut analyzer = PathAnalyzer::new(threshold);
        let input: Vec<OpenCall> = (0..=threshold)
            .map(|i| open(&format!("/home/user{i}/file.txt"), &[]))
            .collect();

        let result = analyze_opens(&input, &mut analyzer, None);

        assert_eq!(result, vec![open("/home/\u{22ef}/file.txt", &[])]);
    }

    #[test]
    fn test_flags_merge_across_collapsed_paths() {
        let mut analyzer = PathAnalyzer::new(3);
        let input = vec![
            open("/home/userA/file.txt", &["READ"]),
            open("/home/userB/file.txt", &["WRITE"]),
            open("/home/userC/file.txt", &["APPEND"]),
            open("/home/userD/file.txt", &["READ", "WRITE"]),
        ];

        let result = analyze_opens(&input, &mut analyzer, None);

        assert_eq!(
            result,
            vec![open("/home/\u{22ef}/file.txt", &["APPEND", "READ", "WRITE"])]
        );
    }

    #[test]
    fn test_no_merging_below_threshold() {
        let mut analyzer = PathAnalyzer::new(3);
        let input = vec![
            open("/home/user2/file2.txt", &["WRITE"]),
            open("/home/user3/file3.txt", &["APPEND"]),
        ];

        let result = analyze_opens(&input, &mut analyzer, None);

        assert_eq!(
            result,
            vec![
                open("/home/user2/file2.txt", &["WRITE"]),
                open("/home/user3/file3.txt", &["APPEND"]),
            ]
        );
    }

    #[test]
    fn test_partial_merging() {
        let mut analyzer = PathAnalyzer::new(3);
        let mut input = generate_opens("/home", "common.txt", 4);
        input.push(open("/var/log/app1.log", &["READ"]));
        input.push(open("/var/log/app2.log", &["WRITE"]));

        let result = analyze_opens(&input, &mut analyzer, None);

        assert_eq!(
            paths(&result),
            vec!["/home/\u{22ef}/common.txt", "/var/log/app1.log", "/var/log/app2.log"]
        );
        assert_eq!(result[0].flags, vec!["APPEND", "READ", "WRITE"]);
    }

    #[test]
    fn test_two_dynamic_groups_stay_separate() {
        let mut analyzer = PathAnalyzer::new(3);
        let mut input = generate_opens("/home", "file1.txt", 4);
        input.extend(generate_opens("/home", "file2.txt", 4));

        let result = analyze_opens(&input, &mut analyzer, None);

        assert_eq!(
            paths(&result),
            vec!["/home/\u{22ef}/file1.txt", "/home/\u{22ef}/file2.txt"]
        );
    }

    #[test]
    fn test_existing_dynamic_segment_absorbs_specific_path() {
        let mut analyzer = PathAnalyzer::new(OPEN_DYNAMIC_THRESHOLD);
        let input = vec![
            open("/data/\u{22ef}/config", &["READ"]),
            open("/data/specific/config", &["WRITE"]),
        ];

        let result = analyze_opens(&input, &mut analyzer, None);

        assert_eq!(result, vec![open("/data/\u{22ef}/config", &["READ", "WRITE"])]);
    }

    #[test]
    fn test_sbom_paths_survive_collapse() {
        let threshold = 3;
        let mut analyzer = PathAnalyzer::new(threshold);
        let mut input: Vec<OpenCall> = (0..=threshold)
            .map(|i| open(&format!("/usr/lib/lib{i}.so"), &["READ"]))
            .collect();
        input.push(open("/usr/lib/libc.so.6", &["READ"]));

        let sbom = HashSet::from(["/usr/lib/libc.so.6".to_string()]);
        let result = analyze_opens(&input, &mut analyzer, Some(&sbom));

        assert!(
            result.iter().any(|o| o.path == "/usr/lib/libc.so.6"),
            "protected path missing from {:?}",
            paths(&result)
        );
    }

    #[test]
    fn test_missing_sbom_behaves_as_empty() {
        let mut analyzer = PathAnalyzer::new(3);
        let input = vec![
            open("/usr/lib/libfoo.so", &["READ"]),
            open("/usr/lib/libbar.so", &["READ"]),
        ];

        let result = analyze_opens(&input, &mut analyzer, None);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_duplicate_paths_do_not_collapse() {
        let mut analyzer = PathAnalyzer::new(3);
        let input: Vec<OpenCall> =
            (0..30).map(|_| open("/data/same-child/file.txt", &["READ"])).collect();

        let result = analyze_opens(&input, &mut analyzer, None);

        assert_eq!(result, vec![open("/data/same-child/file.txt", &["READ"])]);
    }

    #[test]
    fn test_threshold_one_immediate_wildcard() {
        let mut analyzer = PathAnalyzer::with_configs(vec![CollapseConfig::new("/instant", 1)]);
        let input = vec![open("/instant/only-child/data", &["READ"])];

        let result = analyze_opens(&input, &mut analyzer, None);
        assert_eq!(result, vec![open("/instant/*", &["READ"])]);

        let mut analyzer = PathAnalyzer::with_configs(vec![CollapseConfig::new("/instant", 1)]);
        let input = vec![
            open("/instant/first/data", &["READ"]),
            open("/instant/second/data", &["WRITE"]),
        ];

        let result = analyze_opens(&input, &mut analyzer, None);
        assert_eq!(result, vec![open("/instant/*", &["READ", "WRITE"])]);
    }

    #[test]
    fn test_per_prefix_configs_apply_independently() {
        let mut analyzer = PathAnalyzer::with_default_and_configs(
            OPEN_DYNAMIC_THRESHOLD,
            vec![
                CollapseConfig::new("/etc", 50),
                CollapseConfig::new("/opt", 5),
                CollapseConfig::new("/var/run", 3),
                CollapseConfig::new("/app", 1),
            ],
        );

        let mut input: Vec<OpenCall> = Vec::new();
        for i in 0..8 {
            input.push(open(&format!("/etc/config/item{i}"), &["READ"]));
        }
        input.push(open("/etc/hosts", &["READ"]));
        input.push(open("/etc/resolv.conf", &["READ"]));
        for i in 0..6 {
            input.push(open(&format!("/opt/app{i}/binary"), &["READ"]));
        }
        for i in 0..4 {
            input.push(open(&format!("/var/run/pid{i}.pid"), &["READ"]));
        }
        input.push(open("/app/some/deep/path", &["READ"]));
        input.push(open("/app/another/path", &["READ"]));

        let result = analyze_opens(&input, &mut analyzer, None);
        let result_paths = paths(&result);

        // /etc stays below its threshold of 50
        assert_eq!(result_paths.iter().filter(|p| p.starts_with("/etc/")).count(), 10);
        // /app wildcards immediately
        assert!(result_paths.contains(&"/app/*"));
        // /opt and /var/run collapse to one pattern each
        assert_eq!(result_paths.iter().filter(|p| p.starts_with("/opt/")).count(), 1);
        assert_eq!(result_paths.iter().filter(|p| p.starts_with("/var/run/")).count(), 1);
    }

    #[test]
    fn test_output_is_sorted_with_unique_flags() {
        let mut analyzer = PathAnalyzer::new(3);
        let input = vec![
            open("/zeta/file", &["WRITE", "READ", "WRITE"]),
            open("/alpha/file", &["READ", "READ"]),
        ];

        let result = analyze_opens(&input, &mut analyzer, None);

        assert_eq!(paths(&result), vec!["/alpha/file", "/zeta/file"]);
        for call in &result {
            let mut sorted = call.flags.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(call.flags, sorted, "flags not sorted/unique for {}", call.path);
        }
    }

    #[test]
    fn test_new_path_after_collapse_is_absorbed() {
        let threshold = 3;
        let mut analyzer = PathAnalyzer::new(threshold);
        let batch1: Vec<OpenCall> = (0..=threshold)
            .map(|i| open(&format!("/srv/s{i}/log"), &["READ"]))
            .collect();

        let result1 = analyze_opens(&batch1, &mut analyzer, None);
        assert_eq!(result1.len(), 1);

        // a brand-new child arrives once the node is already dynamic
        let mut batch2 = batch1;
        batch2.push(open("/srv/new-service/log", &["WRITE"]));
        let result2 = analyze_opens(&batch2, &mut analyzer, None);

        assert_eq!(result2.len(), 1);
        assert!(result2[0].flags.contains(&"WRITE".to_string()));
    }

    #[test]
    fn test_multi_level_collapse_yields_single_pattern() {
        let threshold = 3;
        let mut analyzer = PathAnalyzer::new(threshold);
        let mut input = Vec::new();
        for i in 0..=threshold {
            for j in 0..=threshold {
                input.push(open(&format!("/multi/level{i}/sub{j}/file"), &["READ"]));
            }
        }

        let result = analyze_opens(&input, &mut analyzer, None);

        assert_eq!(result.len(), 1, "got {:?}", paths(&result));
        let path = &result[0].path;
        assert!(
            path.contains('\u{22ef}') || path.contains('*'),
            "no marker in {path}"
        );
    }

    #[test]
    fn test_empty_input_is_empty() {
        let mut analyzer = PathAnalyzer::new(3);
        assert!(analyze_opens(&[], &mut analyzer, None).is_empty());
    }
}
