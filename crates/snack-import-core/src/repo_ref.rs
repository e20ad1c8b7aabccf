/// Coordinates of a remote repository as typed by the user.
///
/// Every field is a plain string; an empty value means the component could
/// not be determined from the input, not "root" or "default branch".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoReference {
    pub scheme: String,
    pub host: String,
    pub owner: String,
    pub name: String,
    pub subpath: String,
    pub git_ref: String,
}

impl RepoReference {
    /// `scheme://host/owner/name`, or `None` while any of host, owner or
    /// name is still missing. Schemeless input is assumed to be https.
    pub fn repository_url(&self) -> Option<String> {
        if self.host.is_empty() || self.owner.is_empty() || self.name.is_empty() {
            return None;
        }

        let scheme = if self.scheme.is_empty() {
            "https"
        } else {
            self.scheme.as_str()
        };

        Some(format!(
            "{scheme}://{}/{}/{}",
            self.host, self.owner, self.name
        ))
    }
}

const REF_MARKERS: [&str; 3] = ["tree", "blob", "src"];

pub fn parse(raw: &str) -> RepoReference {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return RepoReference::default();
    }

    let (without_fragment, fragment) = match trimmed.split_once('#') {
        Some((head, fragment)) => (head, fragment.trim()),
        None => (trimmed, ""),
    };
    let without_query = without_fragment
        .split_once('?')
        .map_or(without_fragment, |(head, _)| head);

    let (scheme, authority, path) = split_location(without_query);

    let mut reference = RepoReference {
        scheme,
        host: strip_userinfo(authority).to_ascii_lowercase(),
        ..RepoReference::default()
    };

    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    apply_path_segments(&mut reference, &segments);

    if reference.git_ref.is_empty() {
        reference.git_ref = fragment.to_string();
    }

    reference
}

fn split_location(input: &str) -> (String, &str, &str) {
    if let Some((scheme, rest)) = input.split_once("://") {
        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        let scheme = if is_scheme(scheme) {
            scheme.to_ascii_lowercase()
        } else {
            String::new()
        };
        return (scheme, authority, path);
    }

    if let Some((authority, path)) = scp_like_parts(input) {
        return ("ssh".to_string(), authority, path);
    }

    let (authority, path) = input.split_once('/').unwrap_or((input, ""));
    (String::new(), authority, path)
}

fn is_scheme(value: &str) -> bool {
    let mut characters = value.chars();
    let Some(first) = characters.next() else {
        return false;
    };

    first.is_ascii_alphabetic()
        && characters.all(|character| character.is_ascii_alphanumeric() || "+-.".contains(character))
}

// `git@host:owner/name.git`
fn scp_like_parts(input: &str) -> Option<(&str, &str)> {
    let (authority, path) = input.split_once(':')?;
    if authority.is_empty() || authority.contains('/') || !authority.contains('@') {
        return None;
    }
    // `git@host:2222/o/n` is a port, not an owner named 2222.
    let first_segment = path.split('/').next().unwrap_or_default();
    if first_segment.is_empty()
        || first_segment
            .chars()
            .all(|character| character.is_ascii_digit())
    {
        return None;
    }
    Some((authority, path))
}

fn strip_userinfo(authority: &str) -> &str {
    let host = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host);
    host.strip_suffix(':').unwrap_or(host)
}

fn apply_path_segments(reference: &mut RepoReference, segments: &[&str]) {
    let gitlab_marker = (0..segments.len()).find(|&index| is_gitlab_marker(segments, index));

    let (repo_segments, tail): (&[&str], &[&str]) = match gitlab_marker {
        Some(index) => (&segments[..index], &segments[index + 1..]),
        None if segments.len() > 2 => (&segments[..2], &segments[2..]),
        None => (segments, &[]),
    };

    match repo_segments {
        [] => {}
        [owner] => reference.owner = (*owner).to_string(),
        [owners @ .., name] => {
            reference.owner = owners.join("/");
            reference.name = strip_git_suffix(name).to_string();
        }
    }

    if let [marker, git_ref, rest @ ..] = tail {
        if REF_MARKERS.contains(marker) {
            reference.git_ref = (*git_ref).to_string();
            reference.subpath = rest.join("/");
        }
    }
}

// GitLab puts `/-/` between the project and its tree. A `-` directory inside
// a GitHub-style tail is just a folder.
fn is_gitlab_marker(segments: &[&str], index: usize) -> bool {
    if segments[index] != "-" {
        return false;
    }
    if segments
        .get(index + 1)
        .is_some_and(|next| REF_MARKERS.contains(next))
    {
        return true;
    }
    !segments
        .get(2..index)
        .unwrap_or_default()
        .iter()
        .any(|segment| REF_MARKERS.contains(segment))
}

fn strip_git_suffix(name: &str) -> &str {
    name.strip_suffix(".git").unwrap_or(name)
}
