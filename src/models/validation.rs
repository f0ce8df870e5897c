use anyhow::{Result, anyhow};

pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        return Err(anyhow!("user_id cannot be empty"));
    }

    if user_id.chars().count() > 128 {
        return Err(anyhow!("user_id too long (maximum 128 characters)"));
    }

    Ok(())
}
