pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 20;

/// Trim and lowercase a username, then check it against the registration rules.
///
/// Returns the normalized username or a message suitable for the client.
pub fn normalize_username(raw: &str) -> Result<String, &'static str> {
    let username = raw.trim().to_lowercase();

    if username.chars().count() < MIN_USERNAME_LEN {
        return Err("Username must be at least 3 characters long");
    }

    if username.chars().count() > MAX_USERNAME_LEN {
        return Err("Username must be at most 20 characters long");
    }

    if username.contains(char::is_whitespace) {
        return Err("Username cannot contain spaces");
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err("Username can only contain lowercase letters, numbers, and underscores");
    }

    Ok(username)
}
