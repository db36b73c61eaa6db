//! Lexical path arithmetic on string paths.
//!
//! Both `/` and `\` are accepted as separators and a leading drive letter
//! (`C:`) is recognised on every platform, so Windows-style project files
//! behave the same wherever the tool runs.  Results use `/`.

/// Drive designator plus whether the path is rooted, e.g. `"C:/"`, `"/"`, `"C:"`, `""`.
fn split(path: &str) -> (String, Vec<&str>) {
    let mut rest = path;
    let mut root = String::new();

    let b = path.as_bytes();
    if b.len() >= 2 && b[1] == b':' && b[0].is_ascii_alphabetic() {
        root.push(char::from(b[0].to_ascii_uppercase()));
        root.push(':');
        rest = &path[2..];
    }
    if rest.starts_with(['/', '\\']) {
        root.push('/');
    }

    let comps = rest
        .split(['/', '\\'])
        .filter(|c| !c.is_empty() && *c != ".")
        .collect();
    (root, comps)
}

fn join_parts(root: &str, comps: &[&str]) -> String {
    let mut out = root.to_owned();
    out.push_str(&comps.join("/"));
    if out.is_empty() {
        out.push('.');
    }
    out
}

/// `true` for `/x`, `\x` and `C:\x`.
pub fn is_absolute(path: &str) -> bool {
    split(path).0.ends_with('/')
}

/// Resolve `path` against the directory `base` and fold `.` and `..`.
pub fn absolutize(path: &str, base: &str) -> String {
    let joined;
    let full = if is_absolute(path) || base.is_empty() {
        path
    } else {
        joined = format!("{base}/{path}");
        &joined
    };

    let (root, comps) = split(full);
    let mut out: Vec<&str> = Vec::with_capacity(comps.len());
    for c in comps {
        if c == ".." {
            match out.last() {
                Some(&last) if last != ".." => {
                    out.pop();
                }
                // `/..` is `/`.
                _ if root.ends_with('/') => {}
                _ => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    join_parts(&root, &out)
}

/// Directory part of `path` (empty for a bare file name).
pub fn parent(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(0) => &path[..1],
        Some(i) => &path[..i],
        None => "",
    }
}

/// Final component of `path`.
pub fn file_name(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// File name without its last extension.
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(i) => &name[..i],
    }
}

/// Last extension including the dot (`".cpp"`), or empty.
pub fn extension(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => "",
        Some(i) => &name[i..],
    }
}

/// Express `path` relative to the directory `base`.
///
/// Identical paths give `"."`.  Paths that do not share a root (different
/// drives, or one absolute and one relative) cannot be related and are
/// returned unchanged.
pub fn relative(path: &str, base: &str) -> String {
    let (p_root, p_comps) = split(path);
    let (b_root, b_comps) = split(base);

    if p_root == b_root && p_comps == b_comps {
        return ".".to_owned();
    }
    if p_root != b_root {
        return path.to_owned();
    }

    let common = p_comps
        .iter()
        .zip(&b_comps)
        .take_while(|(a, b)| a == b)
        .count();

    let mut out: Vec<&str> = vec![".."; b_comps.len() - common];
    out.extend_from_slice(&p_comps[common..]);
    out.join("/")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
