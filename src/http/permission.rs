use crate::admission::client::{Denial, is_git_client};
use crate::admission::{RequestDescriptor, RuleSet, parse_query};
use crate::auth::AccessLevel;
use crate::config::{AdmissionConfig, AppConfig};
use actix_web::http::StatusCode;
use actix_web::http::header::USER_AGENT;
use actix_web::{HttpRequest, HttpResponse};
use tracing::{debug, warn};

/// What a request that passed the filter is about to do.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Access {
    Read,
    Write,
}

/// Builds the descriptor for a request mounted below `context_path`.
pub fn descriptor(req: &HttpRequest, context_path: &str) -> RequestDescriptor {
    RequestDescriptor::new(
        req.method().as_str(),
        req.path(),
        context_path,
        parse_query(req.query_string()),
    )
}

#[derive(Debug, Clone)]
pub struct PermissionFilter {
    rules: RuleSet,
    context_path: String,
    git_user_agent_prefix: String,
    denied_message: String,
}

impl PermissionFilter {
    pub fn new(config: &AdmissionConfig, context_path: impl Into<String>) -> Self {
        Self {
            rules: config.rule_set(),
            context_path: context_path.into(),
            git_user_agent_prefix: config.git_user_agent_prefix.clone(),
            denied_message: config.denied_message.clone(),
        }
    }

    /// Filter built from the process-wide configuration.
    pub fn from_cfg(context_path: impl Into<String>) -> Self {
        Self::new(AppConfig::admission(), context_path)
    }

    pub fn classify(&self, req: &HttpRequest) -> Access {
        if self.rules.is_write_request(&descriptor(req, &self.context_path)) {
            Access::Write
        } else {
            Access::Read
        }
    }

    pub fn is_git_client(&self, req: &HttpRequest) -> bool {
        let agent = req
            .headers()
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok());
        is_git_client(agent, &self.git_user_agent_prefix)
    }

    /// Lets the request through or returns the 403 to send back.
    ///
    /// Read requests are not checked here, reading is governed by the
    /// authorization layer itself.
    pub fn check(&self, req: &HttpRequest, level: AccessLevel) -> Result<Access, HttpResponse> {
        let access = self.classify(req);
        if access == Access::Read || level.can_write() {
            debug!("{} {} allowed as {:?} with {:?}", req.method(), req.path(), access, level);
            return Ok(access);
        }
        warn!("{} {} needs write privilege, principal has {:?}", req.method(), req.path(), level);
        Err(self.not_enough_privileges(req))
    }

    pub fn not_enough_privileges(&self, req: &HttpRequest) -> HttpResponse {
        let request = descriptor(req, &self.context_path);
        let denial = Denial::for_client(&request, self.is_git_client(req), &self.denied_message);
        HttpResponse::build(StatusCode::FORBIDDEN)
            .insert_header(("Content-Type", denial.content_type))
            .insert_header(("Cache-Control", "no-cache, max-age=0, must-revalidate"))
            .body(denial.body)
    }
}

impl Default for PermissionFilter {
    fn default() -> Self {
        Self::from_cfg("")
    }
}
