use crate::admission::{PARAMETER_SERVICE, RequestDescriptor, URI_REF_INFO};
use bytes::{BufMut, Bytes, BytesMut};

pub const DEFAULT_GIT_USER_AGENT_PREFIX: &str = "git/";
pub const NOT_ENOUGH_PRIVILEGES: &str = "You do not have enough privileges for this operation";

pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// True if the user agent identifies a native git client.
pub fn is_git_client(user_agent: Option<&str>, prefix: &str) -> bool {
    match user_agent {
        Some(agent) => agent
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix)),
        None => false,
    }
}

pub fn write_pkt_line(buf: &mut BytesMut, data: &str) {
    buf.put_slice(format!("{:04x}", data.len() + 4).as_bytes());
    buf.put_slice(data.as_bytes());
}

pub fn write_flush(buf: &mut BytesMut) {
    buf.put_slice(b"0000");
}

/// Body of a rejected request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub content_type: String,
    pub body: Bytes,
}

impl Denial {
    pub fn plain(message: &str) -> Self {
        Self {
            content_type: CONTENT_TYPE_TEXT.to_string(),
            body: Bytes::copy_from_slice(message.as_bytes()),
        }
    }

    /// Protocol-native rejection that a git client prints as `fatal: remote error`.
    ///
    /// Ref discovery answers with a service advertisement whose first ref line
    /// is an `ERR` packet, every other endpoint with a bare `ERR` packet.
    pub fn git(request: &RequestDescriptor, message: &str) -> Self {
        let mut buf = BytesMut::new();
        let service = request
            .query_param(PARAMETER_SERVICE)
            .filter(|_| request.path().ends_with(URI_REF_INFO));
        let content_type = match service {
            Some(service) => {
                write_pkt_line(&mut buf, &format!("# service={}\n", service));
                write_flush(&mut buf);
                format!("application/x-{}-advertisement", service)
            }
            None => match request.path().rsplit('/').next() {
                Some(endpoint) if endpoint.starts_with("git-") => {
                    format!("application/x-{}-result", endpoint)
                }
                _ => CONTENT_TYPE_TEXT.to_string(),
            },
        };
        write_pkt_line(&mut buf, &format!("ERR {}\n", message));
        Self {
            content_type,
            body: buf.freeze(),
        }
    }

    pub fn for_client(request: &RequestDescriptor, git_client: bool, message: &str) -> Self {
        if git_client {
            Self::git(request, message)
        } else {
            Self::plain(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_git_client() {
        assert!(is_git_client(Some("git/2.43.0"), DEFAULT_GIT_USER_AGENT_PREFIX));
        assert!(is_git_client(Some("GIT/1.8"), DEFAULT_GIT_USER_AGENT_PREFIX));
        assert!(!is_git_client(Some("Mozilla/5.0"), DEFAULT_GIT_USER_AGENT_PREFIX));
        assert!(!is_git_client(Some("gi"), DEFAULT_GIT_USER_AGENT_PREFIX));
        assert!(!is_git_client(None, DEFAULT_GIT_USER_AGENT_PREFIX));
    }

    #[test]
    fn test_plain_denial() {
        let denial = Denial::plain("no");
        assert_eq!(denial.content_type, CONTENT_TYPE_TEXT);
        assert_eq!(denial.body, Bytes::from_static(b"no"));
    }

    #[test]
    fn test_git_denial_on_ref_discovery() {
        let request =
            RequestDescriptor::from_uri("GET", "/git/a.git/info/refs?service=git-receive-pack", "");
        let denial = Denial::git(&request, "denied");
        assert_eq!(denial.content_type, "application/x-git-receive-pack-advertisement");
        assert_eq!(
            denial.body,
            Bytes::from_static(b"001f# service=git-receive-pack\n0000000fERR denied\n")
        );
    }

    #[test]
    fn test_git_denial_on_receive_pack() {
        let request = RequestDescriptor::from_uri("POST", "/git/a.git/git-receive-pack", "");
        let denial = Denial::git(&request, "denied");
        assert_eq!(denial.content_type, "application/x-git-receive-pack-result");
        assert_eq!(denial.body, Bytes::from_static(b"000fERR denied\n"));
    }

    #[test]
    fn test_for_client_picks_envelope() {
        let request = RequestDescriptor::from_uri("POST", "/git/a.git/git-receive-pack", "");
        assert_eq!(Denial::for_client(&request, false, "x"), Denial::plain("x"));
        assert_eq!(Denial::for_client(&request, true, "x"), Denial::git(&request, "x"));
    }
}
