//! User administration commands.
//!
//! These route through the account actions so that changing or
//! removing your own account also updates the local session.

use anyhow::Result;
use openlms_app::{actions, App};
use openlms_core::{Role, UserStatus};

/// Change a user's role.
pub async fn set_role(app: &App, id: &str, role: &str) -> Result<()> {
    let Some(role) = Role::parse(role) else {
        anyhow::bail!("Unknown role \"{}\". Expected user, admin or superAdmin.", role);
    };

    let user = actions::users::set_user_role(app, id, role).await?;
    println!("{} <{}> is now {}.", user.name, user.email, user.role);
    Ok(())
}

/// Change a user's status.
pub async fn set_status(app: &App, id: &str, status: &str) -> Result<()> {
    let Some(status) = UserStatus::parse(status) else {
        anyhow::bail!("Unknown status \"{}\". Expected in-progress or blocked.", status);
    };

    let user = actions::users::set_user_status(app, id, status).await?;
    println!("{} <{}> is now {}.", user.name, user.email, user.status);
    Ok(())
}
