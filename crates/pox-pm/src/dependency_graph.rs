//! Dependency graph analysis for installed packages.

use std::collections::HashSet;
use std::sync::Arc;

use crate::package::{Link, LinkType, Package};
use pox_semver::ConstraintInterface;

#[derive(Debug, Clone)]
pub struct DependencyResult {
    pub package: Arc<Package>,
    pub link: Link,
    pub children: Option<Vec<DependencyResult>>,
}

pub fn get_dependents(
    packages: &[Arc<Package>],
    needles: &[String],
    constraint: Option<&dyn ConstraintInterface>,
    invert: bool,
    recurse: bool,
    packages_found: Option<HashSet<String>>,
) -> Vec<DependencyResult> {
    let needles: Vec<String> = needles.iter().map(|n| n.to_lowercase()).collect();
    let mut results = Vec::new();

    let packages_found = packages_found.unwrap_or_else(|| {
        needles.iter().cloned().collect()
    });

    let _root_package = packages.iter().find(|p| {
        p.package_type.as_str() == "project" ||
        p.package_type.as_str() == "root-package"
    });

    for package in packages {
        let mut links = hashmap_to_links(&package.require, &package.name, LinkType::Require);
        let mut packages_in_tree = packages_found.clone();

        if !invert {
            let replace_links = hashmap_to_links(&package.replace, &package.name, LinkType::Replace);
            links.extend(replace_links.clone());

            for replace_link in &replace_links {
                for needle in &needles {
                    if package.name.to_lowercase() == *needle {
                        if constraint.is_none() || matches_constraint(&replace_link.constraint, constraint, false) {
                            let target_lower = replace_link.target.to_lowercase();
                            if packages_in_tree.contains(&target_lower) {
                                results.push(DependencyResult {
                                    package: package.clone(),
                                    link: replace_link.clone(),
                                    children: None,
                                });
                                continue;
                            }
                            packages_in_tree.insert(target_lower.clone());

                            let dependents = if recurse {
                                get_dependents(
                                    packages,
                                    &[target_lower.clone()],
                                    None,
                                    false,
                                    true,
                                    Some(packages_in_tree.clone()),
                                )
                            } else {
                                Vec::new()
                            };

                            results.push(DependencyResult {
                                package: package.clone(),
                                link: replace_link.clone(),
                                children: Some(dependents),
                            });
                        }
                    }
                }
            }
        }

        if package.package_type.as_str() == "project" ||
           package.package_type.as_str() == "root-package" {
            links.extend(hashmap_to_links(&package.require_dev, &package.name, LinkType::DevRequire));
        }

        for link in &links {
            for needle in &needles {
                if link.target.to_lowercase() == *needle {
                    if constraint.is_none() || matches_constraint(&link.constraint, constraint, invert) {
                        let source_lower = package.name.to_lowercase();
                        if packages_in_tree.contains(&source_lower) {
                            results.push(DependencyResult {
                                package: package.clone(),
                                link: link.clone(),
                                children: None,
                            });
                            continue;
                        }
                        packages_in_tree.insert(source_lower.clone());

                        let dependents = if recurse {
                            get_dependents(
                                packages,
                                &[source_lower.clone()],
                                None,
                                false,
                                true,
                                Some(packages_in_tree.clone()),
                            )
                        } else {
                            Vec::new()
                        };

                        results.push(DependencyResult {
                            package: package.clone(),
                            link: link.clone(),
                            children: Some(dependents),
                        });
                    }
                }
            }
        }

        if invert && needles.contains(&package.name.to_lowercase()) {
            let conflict_links = hashmap_to_links(&package.conflict, &package.name, LinkType::Conflict);
            for conflict_link in &conflict_links {
                for other_pkg in packages {
                    if other_pkg.name.to_lowercase() == conflict_link.target.to_lowercase() {
                        if constraint_matches_version(&conflict_link.constraint, &other_pkg.version) == invert {
                            results.push(DependencyResult {
                                package: package.clone(),
                                link: conflict_link.clone(),
                                children: None,
                            });
                        }
                    }
                }
            }
        }

        let conflict_links = hashmap_to_links(&package.conflict, &package.name, LinkType::Conflict);
        for conflict_link in &conflict_links {
            if needles.contains(&conflict_link.target.to_lowercase()) {
                for other_pkg in packages {
                    if other_pkg.name.to_lowercase() == conflict_link.target.to_lowercase() {
                        if constraint_matches_version(&conflict_link.constraint, &other_pkg.version) == invert {
                            results.push(DependencyResult {
                                package: package.clone(),
                                link: conflict_link.clone(),
                                children: None,
                            });
                        }
                    }
                }
            }
        }
    }

    results
}

pub fn find_packages_with_replacers_and_providers(
    packages: &[Arc<Package>],
    name: &str,
    constraint: Option<&dyn ConstraintInterface>,
) -> Vec<Arc<Package>> {
    let name_lower = name.to_lowercase();
    let mut matches = Vec::new();

    for package in packages {
        if package.name.to_lowercase() == name_lower {
            if constraint.is_none() || constraint_matches_version(&constraint.unwrap().to_string(), &package.version) {
                matches.push(package.clone());
            }
            continue;
        }

        for (target, target_constraint) in package.provide.iter().chain(package.replace.iter()) {
            if target.to_lowercase() == name_lower {
                if constraint.is_none() || matches_constraint(target_constraint, constraint, false) {
                    matches.push(package.clone());
                    break;
                }
            }
        }
    }

    matches
}

fn matches_constraint(link_constraint: &str, filter_constraint: Option<&dyn ConstraintInterface>, invert: bool) -> bool {
    if let Some(filter) = filter_constraint {
        let parser = pox_semver::VersionParser;
        if let Ok(parsed) = parser.parse_constraints(link_constraint) {
            let matches = parsed.to_string() == filter.to_string();
            matches != invert
        } else {
            !invert
        }
    } else {
        true
    }
}

fn constraint_matches_version(constraint_str: &str, version: &str) -> bool {
    let parser = pox_semver::VersionParser;
    match parser.parse_constraints(constraint_str) {
        Ok(constraint) => {
            match parser.parse_constraints(version) {
                Ok(ver_constraint) => {
                    constraint.to_string() == ver_constraint.to_string()
                },
                Err(_) => false,
            }
        },
        Err(_) => false,
    }
}

fn hashmap_to_links(
    map: &indexmap::IndexMap<String, String>,
    source: &str,
    link_type: LinkType,
) -> Vec<Link> {
    map.iter()
        .map(|(target, constraint)| Link {
            source: source.to_string(),
            target: target.clone(),
            constraint: constraint.clone(),
            pretty_constraint: Some(constraint.clone()),
            link_type,
        })
        .collect()
}
