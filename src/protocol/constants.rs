//! Well-known controller and action ids.
//!
//! Controller 0 carries the built-in system requests; controller 1 carries
//! server-side extension calls.

/// Controller ids.
pub struct ControllerId;

impl ControllerId {
    pub const SYSTEM: i32 = 0;
    pub const EXTENSION: i32 = 1;
}

/// Action ids handled by the system controller.
pub struct SysAction;

impl SysAction {
    pub const HANDSHAKE: i32 = 0;
    pub const LOGIN: i32 = 1;
    pub const LOGOUT: i32 = 2;
    pub const GET_ROOM_LIST: i32 = 3;
    pub const JOIN_ROOM: i32 = 4;
    pub const AUTO_JOIN: i32 = 5;
    pub const CREATE_ROOM: i32 = 6;
    pub const GENERIC_MESSAGE: i32 = 7;
    pub const CHANGE_ROOM_NAME: i32 = 8;
    pub const CHANGE_ROOM_PASSWORD: i32 = 9;
    pub const OBJECT_MESSAGE: i32 = 10;
    pub const SET_ROOM_VARIABLES: i32 = 11;
    pub const SET_USER_VARIABLES: i32 = 12;
    pub const CALL_EXTENSION: i32 = 13;
    pub const LEAVE_ROOM: i32 = 14;
    pub const SUBSCRIBE_ROOM_GROUP: i32 = 15;
    pub const UNSUBSCRIBE_ROOM_GROUP: i32 = 16;
    pub const SPECTATOR_TO_PLAYER: i32 = 17;
    pub const PLAYER_TO_SPECTATOR: i32 = 18;
    pub const CHANGE_ROOM_CAPACITY: i32 = 19;
    pub const PUBLIC_MESSAGE: i32 = 20;
    pub const PRIVATE_MESSAGE: i32 = 21;
    pub const MODERATOR_MESSAGE: i32 = 22;
    pub const ADMIN_MESSAGE: i32 = 23;
    pub const KICK_USER: i32 = 24;
    pub const BAN_USER: i32 = 25;
    pub const MANUAL_DISCONNECTION: i32 = 26;
    pub const FIND_ROOMS: i32 = 27;
    pub const FIND_USERS: i32 = 28;
    pub const PING_PONG: i32 = 29;
    pub const SET_USER_POSITION: i32 = 30;
}
