use regex::Regex;

pub fn bump_requirement(constraint: &str, installed_version: &str) -> String {
    let constraint = constraint.trim();

    if constraint.starts_with("dev-") {
        return constraint.to_string();
    }

    if installed_version.starts_with("dev-") {
        return constraint.to_string();
    }

    let version = clean_version(installed_version);

    if !is_stable_version(&version) {
        return constraint.to_string();
    }

    let major = get_major_version(&version);
    let new_constraint = bump_constraint_parts(constraint, &version, &major);

    if constraints_equivalent(constraint, &new_constraint) {
        return constraint.to_string();
    }

    new_constraint
}

fn clean_version(version: &str) -> String {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    let version = version.strip_prefix('V').unwrap_or(version);
    let version = version.strip_suffix("-dev").unwrap_or(version);
    let version = version
        .trim_end_matches(".0")
        .trim_end_matches(".9999999");

    let version = if let Some(pos) = version.find("-dev") {
        &version[..pos]
    } else {
        version
    };

    let version = if let Some(pos) = version.find("-alpha") {
        &version[..pos]
    } else {
        version
    };
    let version = if let Some(pos) = version.find("-beta") {
        &version[..pos]
    } else {
        version
    };
    let version = if let Some(pos) = version.find("-RC") {
        &version[..pos]
    } else {
        version
    };

    version.to_string()
}

fn is_stable_version(version: &str) -> bool {
    let lower = version.to_lowercase();
    !lower.contains("alpha")
        && !lower.contains("beta")
        && !lower.contains("-rc")
        && !lower.contains("dev")
        && !lower.contains("snapshot")
}

fn get_major_version(version: &str) -> String {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.is_empty() {
        return version.to_string();
    }

    if parts[0] == "0" && parts.len() > 1 {
        format!("0\\.{}", regex::escape(parts[1]))
    } else {
        regex::escape(parts[0])
    }
}

fn strip_trailing_zeros(version: &str) -> String {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() <= 2 {
        return version.to_string();
    }

    let mut keep = 2;
    for (i, part) in parts.iter().enumerate().skip(2) {
        if *part != "0" {
            keep = i + 1;
        }
    }

    parts[..keep].join(".")
}

fn bump_constraint_parts(constraint: &str, version: &str, major: &str) -> String {
    if constraint.contains("||") {
        let parts: Vec<&str> = constraint.split("||").collect();
        let bumped: Vec<String> = parts
            .into_iter()
            .map(|p| bump_single_constraint(p.trim(), version, major))
            .collect();
        return bumped.join(" || ");
    }

    bump_single_constraint(constraint, version, major)
}

fn bump_single_constraint(constraint: &str, version: &str, major: &str) -> String {
    let constraint = constraint.trim();

    if constraint == "*" || constraint.starts_with("*@") {
        let suffix = if constraint.len() > 1 {
            &constraint[1..]
        } else {
            ""
        };
        let replacement = compute_replacement("*", version);
        return format!("{}{}", replacement, suffix);
    }

    let pattern = format!(
        r"(?x)
        (?P<constraint>
            \^v?{major}(?:\.\d+)* # caret constraint like ^2.x.y
            | ~v?{major}(?:\.\d+){{1,3}} # tilde constraint like ~2.2 or ~2.2.2
            | v?{major}(?:\.[*xX])+ # wildcard like 2.* or 2.x.x (only at major level)
            | >=v?\d+(?:\.\d+)* # greater-or-equal like >=2.0
        )
        (?P<suffix>@\w+)? # stability suffix like @dev
        ",
        major = major
    );

    let re = match Regex::new(&pattern) {
        Ok(r) => r,
        Err(_) => return constraint.to_string(),
    };

    if !re.is_match(constraint) {
        return constraint.to_string();
    }

    let mut result = constraint.to_string();
    let mut offset: i64 = 0;

    let matches: Vec<_> = re.captures_iter(constraint).collect();

    for caps in matches.iter().rev() {
        if let Some(m) = caps.name("constraint") {
            let old_constraint = m.as_str();
            let start = m.start() as i64 + offset;
            let end = if let Some(suffix_match) = caps.name("suffix") {
                suffix_match.end() as i64 + offset
            } else {
                m.end() as i64 + offset
            };

            let replacement = compute_replacement(old_constraint, version);
            let suffix = caps.name("suffix").map(|s| s.as_str()).unwrap_or("");

            let new_part = format!("{}{}", replacement, suffix);

            result = format!(
                "{}{}{}",
                &result[..(start as usize)],
                new_part,
                &result[(end as usize)..]
            );

            offset += new_part.len() as i64 - (end - start);
        }
    }

    result
}

fn compute_replacement(old_constraint: &str, version: &str) -> String {
    let old = old_constraint.trim();
    let clean_version = strip_trailing_zeros(version);

    let old_dot_count = old.matches('.').count();
    let clean_version_dot_count = clean_version.matches('.').count();

    let suffix = if old_dot_count == 2 && clean_version_dot_count == 1 {
        ".0"
    } else {
        ""
    };

    if old.starts_with('~') {
        if old_dot_count >= 2 && !old.contains('*') && !old.contains('x') {
            let version_parts: Vec<&str> = clean_version.split('.').collect();
            let mut result_parts: Vec<&str> = version_parts.clone();

            while result_parts.len() <= old_dot_count {
                result_parts.push("0");
            }

            let result: Vec<&str> = result_parts.into_iter().take(old_dot_count + 1).collect();
            return format!("~{}", result.join("."));
        }
        return format!("^{}{}", clean_version, suffix);
    }

    if old.starts_with('^') {
        if old_dot_count >= 2 {
            let version_parts: Vec<&str> = clean_version.split('.').collect();
            let mut result_parts: Vec<&str> = version_parts.clone();

            while result_parts.len() <= old_dot_count {
                result_parts.push("0");
            }

            let result: Vec<&str> = result_parts.into_iter().take(old_dot_count + 1).collect();
            return format!("^{}", result.join("."));
        }

        return format!("^{}{}", clean_version, suffix);
    }

    if old.starts_with(">=") {
        return format!(">={}{}", clean_version, suffix);
    }

    if old == "*" {
        return format!(">={}{}", clean_version, suffix);
    }

    if old.contains('*') || old.contains('x') || old.contains('X') {
        return format!("^{}{}", clean_version, suffix);
    }

    format!("^{}{}", clean_version, suffix)
}

fn constraints_equivalent(old: &str, new: &str) -> bool {
    let old_normalized = old.replace('v', "").replace('V', "");
    let new_normalized = new.replace('v', "").replace('V', "");

    if old_normalized == new_normalized {
        return true;
    }

    let old_stripped = strip_trailing_zeros_in_constraint(&old_normalized);
    let new_stripped = strip_trailing_zeros_in_constraint(&new_normalized);

    old_stripped == new_stripped
}

fn strip_trailing_zeros_in_constraint(constraint: &str) -> String {
    let re = Regex::new(r"(\d+(?:\.\d+)*)").unwrap();
    re.replace_all(constraint, |caps: &regex::Captures| {
        let version = &caps[1];
        let parts: Vec<&str> = version.split('.').collect();
        if parts.len() <= 1 {
            return version.to_string();
        }

        let mut keep = 1;
        for (i, part) in parts.iter().enumerate() {
            if *part != "0" {
                keep = i + 1;
            }
        }

        parts[..keep].join(".")
    })
    .to_string()
}
