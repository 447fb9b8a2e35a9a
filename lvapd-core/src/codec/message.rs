//! Typed wire messages and their (de)serialization.
//!
//! Each payload struct mirrors a row of the type catalog. [`Message::decode`]
//! and [`Message::encode`] are the only entry points; everything else here
//! is implementation detail of one message type's layout.

use uuid::Uuid;

use super::error::CodecError;
use super::header::{FrameHeader, HEADER_LEN, PROTOCOL_VERSION};
use super::wire::*;
use crate::ids::EtherAddress;

macro_rules! message_type_enum {
    ($($variant:ident = $code:expr),+ $(,)?) => {
        /// Wire type code for a message, see the protocol's type catalog.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum MessageType {
            $($variant = $code),+
        }

        impl MessageType {
            pub fn from_code(code: u8) -> Result<MessageType, CodecError> {
                match code {
                    $($code => Ok(MessageType::$variant),)+
                    other => Err(CodecError::UnknownType(other)),
                }
            }

            pub fn code(self) -> u8 {
                self as u8
            }
        }
    };
}

message_type_enum! {
    Bye = 0x00,
    Register = 0x01,
    LvapJoin = 0x02,
    LvapLeave = 0x03,
    Hello = 0x04,
    ProbeRequest = 0x05,
    ProbeResponse = 0x06,
    AuthRequest = 0x07,
    AuthResponse = 0x08,
    AssocRequest = 0x09,
    AssocResponse = 0x10,
    AddLvap = 0x11,
    DelLvap = 0x12,
    StatusLvap = 0x13,
    SetPort = 0x14,
    StatusPort = 0x15,
    CapsRequest = 0x16,
    CapsResponse = 0x17,
    AddVap = 0x32,
    DelVap = 0x33,
    StatusVap = 0x34,
    AddLvapResponse = 0x51,
    DelLvapResponse = 0x52,
    LvapStatusRequest = 0x53,
    VapStatusRequest = 0x54,
    PortStatusRequest = 0x55,
    TrafficRuleStatusRequest = 0x56,
    AddTrafficRule = 0x57,
    StatusTrafficRule = 0x58,
    WadrrRequest = 0x59,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hello {
    pub seq: u32,
    pub wtp: EtherAddress,
    pub period: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub seq: u32,
    pub wtp: EtherAddress,
    pub sta: EtherAddress,
    pub hwaddr: EtherAddress,
    pub channel: u8,
    pub band: u8,
    pub supported_band: u8,
    pub ssid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub seq: u32,
    pub sta: EtherAddress,
    pub ssid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRequest {
    pub seq: u32,
    pub wtp: EtherAddress,
    pub sta: EtherAddress,
    pub bssid: EtherAddress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthResponse {
    pub seq: u32,
    pub sta: EtherAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssocRequest {
    pub seq: u32,
    pub wtp: EtherAddress,
    pub sta: EtherAddress,
    pub bssid: EtherAddress,
    pub hwaddr: EtherAddress,
    pub channel: u8,
    pub band: u8,
    pub supported_band: u8,
    pub ssid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssocResponse {
    pub seq: u32,
    pub sta: EtherAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLvap {
    pub seq: u32,
    pub module_id: u32,
    pub set_mask: bool,
    pub associated: bool,
    pub authenticated: bool,
    pub assoc_id: u16,
    pub hwaddr: EtherAddress,
    pub channel: u8,
    pub band: u8,
    pub supported_band: u8,
    pub sta: EtherAddress,
    pub encap: EtherAddress,
    pub net_bssid: EtherAddress,
    pub lvap_bssid: EtherAddress,
    pub ssids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelLvap {
    pub seq: u32,
    pub module_id: u32,
    pub sta: EtherAddress,
    pub target_hwaddr: EtherAddress,
    pub target_channel: u8,
    pub target_band: u8,
    pub csa_switch_mode: u8,
    pub csa_switch_count: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLvap {
    pub seq: u32,
    pub set_mask: bool,
    pub associated: bool,
    pub authenticated: bool,
    pub assoc_id: u16,
    pub wtp: EtherAddress,
    pub sta: EtherAddress,
    pub encap: EtherAddress,
    pub hwaddr: EtherAddress,
    pub channel: u8,
    pub band: u8,
    pub supported_band: u8,
    pub net_bssid: EtherAddress,
    pub lvap_bssid: EtherAddress,
    pub ssids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetPort {
    pub seq: u32,
    pub no_ack: bool,
    pub hwaddr: EtherAddress,
    pub channel: u8,
    pub band: u8,
    pub sta: EtherAddress,
    pub rts_cts: u16,
    pub tx_mcast: u8,
    pub ur_mcast_count: u8,
    pub mcs: Vec<u8>,
    pub ht_mcs: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPort {
    pub seq: u32,
    pub no_ack: bool,
    pub wtp: EtherAddress,
    pub sta: EtherAddress,
    pub hwaddr: EtherAddress,
    pub channel: u8,
    pub band: u8,
    pub rts_cts: u16,
    pub tx_mcast: u8,
    pub ur_mcast_count: u8,
    pub mcs: Vec<u8>,
    pub ht_mcs: Vec<u8>,
}

/// A `seq`-only request message. Shared by `CAPS_REQUEST` and the four
/// status-request opcodes, which carry no further payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqOnly {
    pub seq: u32,
}

pub type CapsRequest = SeqOnly;
pub type LvapStatusRequest = SeqOnly;
pub type VapStatusRequest = SeqOnly;
pub type PortStatusRequest = SeqOnly;
pub type TrafficRuleStatusRequest = SeqOnly;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapsResourceBlock {
    pub hwaddr: EtherAddress,
    pub channel: u8,
    pub band: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapsPort {
    pub hwaddr: EtherAddress,
    pub port_id: u16,
    pub iface: [u8; 10],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsResponse {
    pub seq: u32,
    pub wtp: EtherAddress,
    pub blocks: Vec<CapsResourceBlock>,
    pub ports: Vec<CapsPort>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddVap {
    pub seq: u32,
    pub hwaddr: EtherAddress,
    pub channel: u8,
    pub band: u8,
    pub net_bssid: EtherAddress,
    pub ssid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelVap {
    pub seq: u32,
    pub net_bssid: EtherAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusVap {
    pub seq: u32,
    pub wtp: EtherAddress,
    pub hwaddr: EtherAddress,
    pub channel: u8,
    pub band: u8,
    pub net_bssid: EtherAddress,
    pub ssid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLvapResponse {
    pub seq: u32,
    pub wtp: EtherAddress,
    pub sta: EtherAddress,
    pub module_id: u32,
    pub status: u32,
}

pub type DelLvapResponse = AddLvapResponse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTrafficRule {
    pub seq: u32,
    pub amsdu_aggregation: bool,
    pub quantum: u16,
    pub dscp: u8,
    pub ssid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTrafficRule {
    pub seq: u32,
    pub wtp: EtherAddress,
    pub hwaddr: EtherAddress,
    pub channel: u8,
    pub band: u8,
    pub amsdu_aggregation: bool,
    pub quantum: u16,
    pub dscp: u8,
    pub ssid: String,
}

/// Application-level request reserved in the protocol table for the
/// weighted airtime deficit round robin (WADRR) scheduling data. Framing
/// only; computing or acting on the data is an external application's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WadrrRequest {
    pub seq: u32,
    pub tenant_id: Uuid,
}

/// A fully decoded, typed wire message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Bye,
    Register,
    LvapJoin,
    LvapLeave,
    Hello(Hello),
    ProbeRequest(ProbeRequest),
    ProbeResponse(ProbeResponse),
    AuthRequest(AuthRequest),
    AuthResponse(AuthResponse),
    AssocRequest(AssocRequest),
    AssocResponse(AssocResponse),
    AddLvap(AddLvap),
    DelLvap(DelLvap),
    StatusLvap(StatusLvap),
    SetPort(SetPort),
    StatusPort(StatusPort),
    CapsRequest(CapsRequest),
    CapsResponse(CapsResponse),
    AddVap(AddVap),
    DelVap(DelVap),
    StatusVap(StatusVap),
    AddLvapResponse(AddLvapResponse),
    DelLvapResponse(DelLvapResponse),
    LvapStatusRequest(LvapStatusRequest),
    VapStatusRequest(VapStatusRequest),
    PortStatusRequest(PortStatusRequest),
    TrafficRuleStatusRequest(TrafficRuleStatusRequest),
    AddTrafficRule(AddTrafficRule),
    StatusTrafficRule(StatusTrafficRule),
    WadrrRequest(WadrrRequest),
}

impl Message {
    pub fn msg_type(&self) -> MessageType {
        match self {
            Message::Bye => MessageType::Bye,
            Message::Register => MessageType::Register,
            Message::LvapJoin => MessageType::LvapJoin,
            Message::LvapLeave => MessageType::LvapLeave,
            Message::Hello(_) => MessageType::Hello,
            Message::ProbeRequest(_) => MessageType::ProbeRequest,
            Message::ProbeResponse(_) => MessageType::ProbeResponse,
            Message::AuthRequest(_) => MessageType::AuthRequest,
            Message::AuthResponse(_) => MessageType::AuthResponse,
            Message::AssocRequest(_) => MessageType::AssocRequest,
            Message::AssocResponse(_) => MessageType::AssocResponse,
            Message::AddLvap(_) => MessageType::AddLvap,
            Message::DelLvap(_) => MessageType::DelLvap,
            Message::StatusLvap(_) => MessageType::StatusLvap,
            Message::SetPort(_) => MessageType::SetPort,
            Message::StatusPort(_) => MessageType::StatusPort,
            Message::CapsRequest(_) => MessageType::CapsRequest,
            Message::CapsResponse(_) => MessageType::CapsResponse,
            Message::AddVap(_) => MessageType::AddVap,
            Message::DelVap(_) => MessageType::DelVap,
            Message::StatusVap(_) => MessageType::StatusVap,
            Message::AddLvapResponse(_) => MessageType::AddLvapResponse,
            Message::DelLvapResponse(_) => MessageType::DelLvapResponse,
            Message::LvapStatusRequest(_) => MessageType::LvapStatusRequest,
            Message::VapStatusRequest(_) => MessageType::VapStatusRequest,
            Message::PortStatusRequest(_) => MessageType::PortStatusRequest,
            Message::TrafficRuleStatusRequest(_) => MessageType::TrafficRuleStatusRequest,
            Message::AddTrafficRule(_) => MessageType::AddTrafficRule,
            Message::StatusTrafficRule(_) => MessageType::StatusTrafficRule,
            Message::WadrrRequest(_) => MessageType::WadrrRequest,
        }
    }

    /// Decode a complete frame (header included). `frame.len()` must equal
    /// the header's declared `length`; a mismatch is a [`CodecError::FieldOverflow`].
    pub fn decode(frame: &[u8]) -> Result<Message, CodecError> {
        let header = FrameHeader::parse(frame)?;
        if header.version != PROTOCOL_VERSION {
            return Err(CodecError::BadVersion { expected: PROTOCOL_VERSION, got: header.version });
        }
        if header.length as usize != frame.len() {
            return Err(CodecError::FieldOverflow(format!(
                "header declared {} bytes, frame has {}",
                header.length,
                frame.len()
            )));
        }
        let payload = &frame[HEADER_LEN..];
        let msg_type = MessageType::from_code(header.msg_type)?;
        decode_payload(msg_type, payload)
    }

    /// Encode this message into a complete frame (header included).
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        encode_payload(self, &mut payload);
        let header = FrameHeader {
            version: PROTOCOL_VERSION,
            msg_type: self.msg_type().code(),
            length: (HEADER_LEN + payload.len()) as u32,
        };
        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        header.encode(&mut out);
        out.extend_from_slice(&payload);
        out
    }
}

fn decode_payload(msg_type: MessageType, p: &[u8]) -> Result<Message, CodecError> {
    use MessageType::*;
    Ok(match msg_type {
        Bye => Message::Bye,
        Register => Message::Register,
        LvapJoin => Message::LvapJoin,
        LvapLeave => Message::LvapLeave,
        Hello => {
            let seq = read_u32(p, 0)?;
            let wtp = read_addr(p, 4)?;
            let period = read_u32(p, 10)?;
            Message::Hello(self::Hello { seq, wtp, period })
        }
        ProbeRequest => {
            let seq = read_u32(p, 0)?;
            let wtp = read_addr(p, 4)?;
            let sta = read_addr(p, 10)?;
            let hwaddr = read_addr(p, 16)?;
            let channel = read_u8(p, 22)?;
            let band = read_u8(p, 23)?;
            let supported_band = read_u8(p, 24)?;
            let ssid = read_tail_string(p, 25)?;
            Message::ProbeRequest(self::ProbeRequest {
                seq,
                wtp,
                sta,
                hwaddr,
                channel,
                band,
                supported_band,
                ssid,
            })
        }
        ProbeResponse => {
            let seq = read_u32(p, 0)?;
            let sta = read_addr(p, 4)?;
            let ssid = read_tail_string(p, 10)?;
            Message::ProbeResponse(self::ProbeResponse { seq, sta, ssid })
        }
        AuthRequest => {
            let seq = read_u32(p, 0)?;
            let wtp = read_addr(p, 4)?;
            let sta = read_addr(p, 10)?;
            let bssid = read_addr(p, 16)?;
            Message::AuthRequest(self::AuthRequest { seq, wtp, sta, bssid })
        }
        AuthResponse => {
            let seq = read_u32(p, 0)?;
            let sta = read_addr(p, 4)?;
            Message::AuthResponse(self::AuthResponse { seq, sta })
        }
        AssocRequest => {
            let seq = read_u32(p, 0)?;
            let wtp = read_addr(p, 4)?;
            let sta = read_addr(p, 10)?;
            let bssid = read_addr(p, 16)?;
            let hwaddr = read_addr(p, 22)?;
            let channel = read_u8(p, 28)?;
            let band = read_u8(p, 29)?;
            let supported_band = read_u8(p, 30)?;
            let ssid = read_tail_string(p, 31)?;
            Message::AssocRequest(self::AssocRequest {
                seq,
                wtp,
                sta,
                bssid,
                hwaddr,
                channel,
                band,
                supported_band,
                ssid,
            })
        }
        AssocResponse => {
            let seq = read_u32(p, 0)?;
            let sta = read_addr(p, 4)?;
            Message::AssocResponse(self::AssocResponse { seq, sta })
        }
        AddLvap => {
            let seq = read_u32(p, 0)?;
            let module_id = read_u32(p, 4)?;
            let flags = read_u16(p, 8)?;
            let set_mask = flags & 0b100 != 0;
            let associated = flags & 0b010 != 0;
            let authenticated = flags & 0b001 != 0;
            let assoc_id = read_u16(p, 10)?;
            let hwaddr = read_addr(p, 12)?;
            let channel = read_u8(p, 18)?;
            let band = read_u8(p, 19)?;
            let supported_band = read_u8(p, 20)?;
            let sta = read_addr(p, 21)?;
            let encap = read_addr(p, 27)?;
            let net_bssid = read_addr(p, 33)?;
            let lvap_bssid = read_addr(p, 39)?;
            let ssids = read_ssids(p, 45)?;
            Message::AddLvap(self::AddLvap {
                seq,
                module_id,
                set_mask,
                associated,
                authenticated,
                assoc_id,
                hwaddr,
                channel,
                band,
                supported_band,
                sta,
                encap,
                net_bssid,
                lvap_bssid,
                ssids,
            })
        }
        DelLvap => {
            let seq = read_u32(p, 0)?;
            let module_id = read_u32(p, 4)?;
            let sta = read_addr(p, 8)?;
            let target_hwaddr = read_addr(p, 14)?;
            let target_channel = read_u8(p, 20)?;
            let target_band = read_u8(p, 21)?;
            let csa_switch_mode = read_u8(p, 22)?;
            let csa_switch_count = read_u8(p, 23)?;
            Message::DelLvap(self::DelLvap {
                seq,
                module_id,
                sta,
                target_hwaddr,
                target_channel,
                target_band,
                csa_switch_mode,
                csa_switch_count,
            })
        }
        StatusLvap => {
            let seq = read_u32(p, 0)?;
            let flags = read_u16(p, 4)?;
            let set_mask = flags & 0b100 != 0;
            let associated = flags & 0b010 != 0;
            let authenticated = flags & 0b001 != 0;
            let assoc_id = read_u16(p, 6)?;
            let wtp = read_addr(p, 8)?;
            let sta = read_addr(p, 14)?;
            let encap = read_addr(p, 20)?;
            let hwaddr = read_addr(p, 26)?;
            let channel = read_u8(p, 32)?;
            let band = read_u8(p, 33)?;
            let supported_band = read_u8(p, 34)?;
            let net_bssid = read_addr(p, 35)?;
            let lvap_bssid = read_addr(p, 41)?;
            let ssids = read_ssids(p, 47)?;
            Message::StatusLvap(self::StatusLvap {
                seq,
                set_mask,
                associated,
                authenticated,
                assoc_id,
                wtp,
                sta,
                encap,
                hwaddr,
                channel,
                band,
                supported_band,
                net_bssid,
                lvap_bssid,
                ssids,
            })
        }
        SetPort => {
            let seq = read_u32(p, 0)?;
            let flags = read_u16(p, 4)?;
            let no_ack = flags & 0b1 != 0;
            let hwaddr = read_addr(p, 6)?;
            let channel = read_u8(p, 12)?;
            let band = read_u8(p, 13)?;
            let sta = read_addr(p, 14)?;
            let rts_cts = read_u16(p, 20)?;
            let tx_mcast = read_u8(p, 22)?;
            let ur_mcast_count = read_u8(p, 23)?;
            let nb_mcs = read_u8(p, 24)? as usize;
            let nb_ht_mcs = read_u8(p, 25)? as usize;
            need(p, 26, nb_mcs + nb_ht_mcs)?;
            let mcs = p[26..26 + nb_mcs].to_vec();
            let ht_mcs = p[26 + nb_mcs..26 + nb_mcs + nb_ht_mcs].to_vec();
            Message::SetPort(self::SetPort {
                seq,
                no_ack,
                hwaddr,
                channel,
                band,
                sta,
                rts_cts,
                tx_mcast,
                ur_mcast_count,
                mcs,
                ht_mcs,
            })
        }
        StatusPort => {
            let seq = read_u32(p, 0)?;
            let flags = read_u16(p, 4)?;
            let no_ack = flags & 0b1 != 0;
            let wtp = read_addr(p, 6)?;
            let sta = read_addr(p, 12)?;
            let hwaddr = read_addr(p, 18)?;
            let channel = read_u8(p, 24)?;
            let band = read_u8(p, 25)?;
            let rts_cts = read_u16(p, 26)?;
            let tx_mcast = read_u8(p, 28)?;
            let ur_mcast_count = read_u8(p, 29)?;
            let nb_mcs = read_u8(p, 30)? as usize;
            let nb_ht_mcs = read_u8(p, 31)? as usize;
            need(p, 32, nb_mcs + nb_ht_mcs)?;
            let mcs = p[32..32 + nb_mcs].to_vec();
            let ht_mcs = p[32 + nb_mcs..32 + nb_mcs + nb_ht_mcs].to_vec();
            Message::StatusPort(self::StatusPort {
                seq,
                no_ack,
                wtp,
                sta,
                hwaddr,
                channel,
                band,
                rts_cts,
                tx_mcast,
                ur_mcast_count,
                mcs,
                ht_mcs,
            })
        }
        CapsRequest => Message::CapsRequest(SeqOnly { seq: read_u32(p, 0)? }),
        CapsResponse => {
            let seq = read_u32(p, 0)?;
            let wtp = read_addr(p, 4)?;
            let nb_blocks = read_u8(p, 10)? as usize;
            let nb_ports = read_u8(p, 11)? as usize;
            let mut at = 12;
            let mut blocks = Vec::with_capacity(nb_blocks);
            for _ in 0..nb_blocks {
                let hwaddr = read_addr(p, at)?;
                let channel = read_u8(p, at + 6)?;
                let band = read_u8(p, at + 7)?;
                blocks.push(CapsResourceBlock { hwaddr, channel, band });
                at += 8;
            }
            let mut ports = Vec::with_capacity(nb_ports);
            for _ in 0..nb_ports {
                let hwaddr = read_addr(p, at)?;
                let port_id = read_u16(p, at + 6)?;
                need(p, at + 8, 10)?;
                let mut iface = [0u8; 10];
                iface.copy_from_slice(&p[at + 8..at + 18]);
                ports.push(CapsPort { hwaddr, port_id, iface });
                at += 18;
            }
            Message::CapsResponse(self::CapsResponse { seq, wtp, blocks, ports })
        }
        AddVap => {
            let seq = read_u32(p, 0)?;
            let hwaddr = read_addr(p, 4)?;
            let channel = read_u8(p, 10)?;
            let band = read_u8(p, 11)?;
            let net_bssid = read_addr(p, 12)?;
            let ssid = read_tail_string(p, 18)?;
            Message::AddVap(self::AddVap { seq, hwaddr, channel, band, net_bssid, ssid })
        }
        DelVap => {
            let seq = read_u32(p, 0)?;
            let net_bssid = read_addr(p, 4)?;
            Message::DelVap(self::DelVap { seq, net_bssid })
        }
        StatusVap => {
            let seq = read_u32(p, 0)?;
            let wtp = read_addr(p, 4)?;
            let hwaddr = read_addr(p, 10)?;
            let channel = read_u8(p, 16)?;
            let band = read_u8(p, 17)?;
            let net_bssid = read_addr(p, 18)?;
            let ssid = read_tail_string(p, 24)?;
            Message::StatusVap(self::StatusVap { seq, wtp, hwaddr, channel, band, net_bssid, ssid })
        }
        AddLvapResponse | DelLvapResponse => {
            let seq = read_u32(p, 0)?;
            let wtp = read_addr(p, 4)?;
            let sta = read_addr(p, 10)?;
            let module_id = read_u32(p, 16)?;
            let status = read_u32(p, 20)?;
            let resp = self::AddLvapResponse { seq, wtp, sta, module_id, status };
            if msg_type == AddLvapResponse {
                Message::AddLvapResponse(resp)
            } else {
                Message::DelLvapResponse(resp)
            }
        }
        LvapStatusRequest => Message::LvapStatusRequest(SeqOnly { seq: read_u32(p, 0)? }),
        VapStatusRequest => Message::VapStatusRequest(SeqOnly { seq: read_u32(p, 0)? }),
        PortStatusRequest => Message::PortStatusRequest(SeqOnly { seq: read_u32(p, 0)? }),
        TrafficRuleStatusRequest => {
            Message::TrafficRuleStatusRequest(SeqOnly { seq: read_u32(p, 0)? })
        }
        AddTrafficRule => {
            let seq = read_u32(p, 0)?;
            let flags = read_u16(p, 4)?;
            let amsdu_aggregation = flags & 0b1 != 0;
            let quantum = read_u16(p, 6)?;
            let dscp = read_u8(p, 8)?;
            let ssid = read_tail_string(p, 9)?;
            Message::AddTrafficRule(self::AddTrafficRule {
                seq,
                amsdu_aggregation,
                quantum,
                dscp,
                ssid,
            })
        }
        StatusTrafficRule => {
            let seq = read_u32(p, 0)?;
            let wtp = read_addr(p, 4)?;
            let hwaddr = read_addr(p, 10)?;
            let channel = read_u8(p, 16)?;
            let band = read_u8(p, 17)?;
            let flags = read_u16(p, 18)?;
            let amsdu_aggregation = flags & 0b1 != 0;
            let quantum = read_u16(p, 20)?;
            let dscp = read_u8(p, 22)?;
            let ssid = read_tail_string(p, 23)?;
            Message::StatusTrafficRule(self::StatusTrafficRule {
                seq,
                wtp,
                hwaddr,
                channel,
                band,
                amsdu_aggregation,
                quantum,
                dscp,
                ssid,
            })
        }
        WadrrRequest => {
            let seq = read_u32(p, 0)?;
            need(p, 4, 16)?;
            let mut raw = [0u8; 16];
            raw.copy_from_slice(&p[4..20]);
            let tenant_id = Uuid::from_bytes(raw);
            Message::WadrrRequest(self::WadrrRequest { seq, tenant_id })
        }
    })
}

fn encode_payload(msg: &Message, out: &mut Vec<u8>) {
    match msg {
        Message::Bye | Message::Register | Message::LvapJoin | Message::LvapLeave => {}
        Message::Hello(m) => {
            write_u32(out, m.seq);
            write_addr(out, &m.wtp);
            write_u32(out, m.period);
        }
        Message::ProbeRequest(m) => {
            write_u32(out, m.seq);
            write_addr(out, &m.wtp);
            write_addr(out, &m.sta);
            write_addr(out, &m.hwaddr);
            write_u8(out, m.channel);
            write_u8(out, m.band);
            write_u8(out, m.supported_band);
            write_tail(out, &m.ssid);
        }
        Message::ProbeResponse(m) => {
            write_u32(out, m.seq);
            write_addr(out, &m.sta);
            write_tail(out, &m.ssid);
        }
        Message::AuthRequest(m) => {
            write_u32(out, m.seq);
            write_addr(out, &m.wtp);
            write_addr(out, &m.sta);
            write_addr(out, &m.bssid);
        }
        Message::AuthResponse(m) => {
            write_u32(out, m.seq);
            write_addr(out, &m.sta);
        }
        Message::AssocRequest(m) => {
            write_u32(out, m.seq);
            write_addr(out, &m.wtp);
            write_addr(out, &m.sta);
            write_addr(out, &m.bssid);
            write_addr(out, &m.hwaddr);
            write_u8(out, m.channel);
            write_u8(out, m.band);
            write_u8(out, m.supported_band);
            write_tail(out, &m.ssid);
        }
        Message::AssocResponse(m) => {
            write_u32(out, m.seq);
            write_addr(out, &m.sta);
        }
        Message::AddLvap(m) => {
            write_u32(out, m.seq);
            write_u32(out, m.module_id);
            let mut flags: u16 = 0;
            if m.set_mask {
                flags |= 0b100;
            }
            if m.associated {
                flags |= 0b010;
            }
            if m.authenticated {
                flags |= 0b001;
            }
            write_u16(out, flags);
            write_u16(out, m.assoc_id);
            write_addr(out, &m.hwaddr);
            write_u8(out, m.channel);
            write_u8(out, m.band);
            write_u8(out, m.supported_band);
            write_addr(out, &m.sta);
            write_addr(out, &m.encap);
            write_addr(out, &m.net_bssid);
            write_addr(out, &m.lvap_bssid);
            write_ssids(out, &m.ssids);
        }
        Message::DelLvap(m) => {
            write_u32(out, m.seq);
            write_u32(out, m.module_id);
            write_addr(out, &m.sta);
            write_addr(out, &m.target_hwaddr);
            write_u8(out, m.target_channel);
            write_u8(out, m.target_band);
            write_u8(out, m.csa_switch_mode);
            write_u8(out, m.csa_switch_count);
        }
        Message::StatusLvap(m) => {
            write_u32(out, m.seq);
            let mut flags: u16 = 0;
            if m.set_mask {
                flags |= 0b100;
            }
            if m.associated {
                flags |= 0b010;
            }
            if m.authenticated {
                flags |= 0b001;
            }
            write_u16(out, flags);
            write_u16(out, m.assoc_id);
            write_addr(out, &m.wtp);
            write_addr(out, &m.sta);
            write_addr(out, &m.encap);
            write_addr(out, &m.hwaddr);
            write_u8(out, m.channel);
            write_u8(out, m.band);
            write_u8(out, m.supported_band);
            write_addr(out, &m.net_bssid);
            write_addr(out, &m.lvap_bssid);
            write_ssids(out, &m.ssids);
        }
        Message::SetPort(m) => {
            write_u32(out, m.seq);
            write_u16(out, if m.no_ack { 1 } else { 0 });
            write_addr(out, &m.hwaddr);
            write_u8(out, m.channel);
            write_u8(out, m.band);
            write_addr(out, &m.sta);
            write_u16(out, m.rts_cts);
            write_u8(out, m.tx_mcast);
            write_u8(out, m.ur_mcast_count);
            write_u8(out, m.mcs.len() as u8);
            write_u8(out, m.ht_mcs.len() as u8);
            out.extend_from_slice(&m.mcs);
            out.extend_from_slice(&m.ht_mcs);
        }
        Message::StatusPort(m) => {
            write_u32(out, m.seq);
            write_u16(out, if m.no_ack { 1 } else { 0 });
            write_addr(out, &m.wtp);
            write_addr(out, &m.sta);
            write_addr(out, &m.hwaddr);
            write_u8(out, m.channel);
            write_u8(out, m.band);
            write_u16(out, m.rts_cts);
            write_u8(out, m.tx_mcast);
            write_u8(out, m.ur_mcast_count);
            write_u8(out, m.mcs.len() as u8);
            write_u8(out, m.ht_mcs.len() as u8);
            out.extend_from_slice(&m.mcs);
            out.extend_from_slice(&m.ht_mcs);
        }
        Message::CapsRequest(m) => write_u32(out, m.seq),
        Message::CapsResponse(m) => {
            write_u32(out, m.seq);
            write_addr(out, &m.wtp);
            write_u8(out, m.blocks.len() as u8);
            write_u8(out, m.ports.len() as u8);
            for b in &m.blocks {
                write_addr(out, &b.hwaddr);
                write_u8(out, b.channel);
                write_u8(out, b.band);
            }
            for p in &m.ports {
                write_addr(out, &p.hwaddr);
                write_u16(out, p.port_id);
                out.extend_from_slice(&p.iface);
            }
        }
        Message::AddVap(m) => {
            write_u32(out, m.seq);
            write_addr(out, &m.hwaddr);
            write_u8(out, m.channel);
            write_u8(out, m.band);
            write_addr(out, &m.net_bssid);
            write_tail(out, &m.ssid);
        }
        Message::DelVap(m) => {
            write_u32(out, m.seq);
            write_addr(out, &m.net_bssid);
        }
        Message::StatusVap(m) => {
            write_u32(out, m.seq);
            write_addr(out, &m.wtp);
            write_addr(out, &m.hwaddr);
            write_u8(out, m.channel);
            write_u8(out, m.band);
            write_addr(out, &m.net_bssid);
            write_tail(out, &m.ssid);
        }
        Message::AddLvapResponse(m) | Message::DelLvapResponse(m) => {
            write_u32(out, m.seq);
            write_addr(out, &m.wtp);
            write_addr(out, &m.sta);
            write_u32(out, m.module_id);
            write_u32(out, m.status);
        }
        Message::LvapStatusRequest(m)
        | Message::VapStatusRequest(m)
        | Message::PortStatusRequest(m)
        | Message::TrafficRuleStatusRequest(m) => write_u32(out, m.seq),
        Message::AddTrafficRule(m) => {
            write_u32(out, m.seq);
            write_u16(out, if m.amsdu_aggregation { 1 } else { 0 });
            write_u16(out, m.quantum);
            write_u8(out, m.dscp);
            write_tail(out, &m.ssid);
        }
        Message::StatusTrafficRule(m) => {
            write_u32(out, m.seq);
            write_addr(out, &m.wtp);
            write_addr(out, &m.hwaddr);
            write_u8(out, m.channel);
            write_u8(out, m.band);
            write_u16(out, if m.amsdu_aggregation { 1 } else { 0 });
            write_u16(out, m.quantum);
            write_u8(out, m.dscp);
            write_tail(out, &m.ssid);
        }
        Message::WadrrRequest(m) => {
            write_u32(out, m.seq);
            out.extend_from_slice(m.tenant_id.as_bytes());
        }
    }
}
