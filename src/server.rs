//! UDP DNS responder.
//!
//! Each inbound packet goes through Receive → Classify → Answer, with no
//! state carried between queries. Only the first question of a message is
//! inspected, and only A questions can produce a positive match; everything
//! else gets an NXDOMAIN reply. Matched names are answered authoritatively
//! with a single A record pointing at `127.0.0.1`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use hickory_proto::error::ProtoError;
use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record, RecordType};
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::domains::DomainSet;
use crate::error::{CrapDnsError, Result};

/// Fixed listening endpoint: the standard DNS port on loopback.
pub const LISTEN_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 53);

/// TTL of the loopback answers handed out.
pub const ANSWER_TTL: u32 = 120;

/// Answers A queries for the configured domains with the loopback address.
///
/// Holds a read-only [`DomainSet`] for the lifetime of the process; queries
/// share it without synchronization because it is never mutated after
/// startup.
pub struct QueryResponder {
    domains: Arc<DomainSet>,
}

impl QueryResponder {
    #[must_use]
    pub fn new(domains: Arc<DomainSet>) -> Self {
        Self { domains }
    }

    /// Binds `addr` and answers queries until the task is dropped.
    ///
    /// Receive errors on the socket are logged and the loop continues; a
    /// query is never left unanswered because a *previous* packet failed.
    ///
    /// # Errors
    ///
    /// Returns [`CrapDnsError::Bind`] if the socket cannot be acquired
    /// (port in use, or port 53 without root).
    pub async fn run(&self, addr: SocketAddr) -> Result<()> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| CrapDnsError::Bind { addr, source })?;
        info!(%addr, domains = self.domains.len(), "listening");

        let mut buf = [0u8; 512];
        loop {
            let (len, peer) = match socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    warn!(error = %e, "recv failed");
                    continue;
                }
            };

            match self.answer(&buf[..len]) {
                Ok(reply) => {
                    if let Err(e) = socket.send_to(&reply, peer).await {
                        warn!(%peer, error = %e, "send failed");
                    }
                }
                // Not decodable as DNS; there is no id/question to echo, so
                // nothing sensible can be sent back.
                Err(e) => debug!(%peer, error = %e, "dropping undecodable packet"),
            }
        }
    }

    /// Builds the wire reply for one query packet.
    ///
    /// A matched A question yields an authoritative reply with exactly one
    /// A record (queried name, TTL 120, `127.0.0.1`). Anything else —
    /// non-A question, no matching domain — yields NXDOMAIN with no
    /// answers. A message without any question yields FORMERR. In every
    /// case the request's recursion-desired flag is mirrored into
    /// recursion-available.
    ///
    /// # Errors
    ///
    /// Returns the codec error if the packet cannot be decoded as a DNS
    /// message or the reply cannot be encoded.
    pub fn answer(&self, packet: &[u8]) -> std::result::Result<Vec<u8>, ProtoError> {
        let request = Message::from_vec(packet)?;

        let mut reply = Message::new();
        reply
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .set_op_code(request.op_code())
            .set_recursion_desired(request.recursion_desired())
            .set_recursion_available(request.recursion_desired());

        let Some(question) = request.queries().first() else {
            debug!("query without a question section");
            reply.set_response_code(ResponseCode::FormErr);
            return reply.to_vec();
        };
        reply.add_query(question.clone());

        if question.query_type() == RecordType::A && self.domains.matches(question.name()) {
            debug!(qname = %question.name(), "answering with loopback");
            reply.set_authoritative(true);
            reply.add_answer(Record::from_rdata(
                question.name().clone(),
                ANSWER_TTL,
                RData::A(A::new(127, 0, 0, 1)),
            ));
        } else {
            debug!(qname = %question.name(), qtype = %question.query_type(), "not ours, NXDOMAIN");
            reply.set_response_code(ResponseCode::NXDomain);
        }

        reply.to_vec()
    }
}
