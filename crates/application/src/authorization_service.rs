//! Authorization guard consulted before every storage access.

use academy_core::{AppError, AppResult, Caller, Role, UserId};
use academy_domain::{Permission, permissions_for};
use tracing::warn;

use crate::{RateLimitRule, RateLimitService};

/// Application service enforcing authentication, role, permission and write budgets.
#[derive(Clone)]
pub struct AuthorizationService {
    rate_limit_service: RateLimitService,
    write_rule: RateLimitRule,
}

impl AuthorizationService {
    /// Creates a guard that meters writes with `write_rule`.
    #[must_use]
    pub fn new(rate_limit_service: RateLimitService, write_rule: RateLimitRule) -> Self {
        Self {
            rate_limit_service,
            write_rule,
        }
    }

    /// Fails with `Unauthorized` when no caller is attached.
    pub fn require_authenticated(caller: Option<&Caller>) -> AppResult<&Caller> {
        caller.ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))
    }

    /// Fails with `Forbidden` unless the caller holds one of `roles`.
    pub fn require_role<'a>(caller: &'a Caller, roles: &[Role]) -> AppResult<&'a Caller> {
        if roles.contains(&caller.role()) {
            return Ok(caller);
        }

        Err(AppError::Forbidden(format!(
            "role '{}' may not perform this operation",
            caller.role()
        )))
    }

    /// Fails with `Forbidden` unless the caller's role grants `permission`.
    pub fn require_permission(caller: &Caller, permission: Permission) -> AppResult<&Caller> {
        if permissions_for(caller.role()).contains(&permission) {
            return Ok(caller);
        }

        Err(AppError::Forbidden(format!(
            "role '{}' is missing permission '{}'",
            caller.role(),
            permission.as_str()
        )))
    }

    /// Returns whether the caller owns the resource or is an admin.
    #[must_use]
    pub fn is_owner(caller: &Caller, owner_id: UserId) -> bool {
        caller.role() == Role::Admin || caller.id() == owner_id
    }

    /// Spends one unit of the caller's write budget.
    ///
    /// A failing rate-limit store rejects the write.
    pub async fn check_write_rate_limit(&self, caller: &Caller) -> AppResult<()> {
        let identifier = caller.id().to_string();
        match self.rate_limit_service.allow(&self.write_rule, &identifier).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(
                    caller_id = %caller.id(),
                    category = %self.write_rule.category,
                    "write rate limit exceeded"
                );
                Err(AppError::RateLimited(
                    "too many write requests, please try again later".to_owned(),
                ))
            }
            Err(error) => Err(AppError::Internal(format!(
                "rate limiter unavailable: {error}"
            ))),
        }
    }

    /// Checks the permission, then spends one unit of write budget.
    pub async fn authorize_write<'a>(
        &self,
        caller: &'a Caller,
        permission: Permission,
    ) -> AppResult<&'a Caller> {
        Self::require_permission(caller, permission)?;
        self.check_write_rate_limit(caller).await?;
        Ok(caller)
    }
}

#[cfg(test)]
mod tests;
