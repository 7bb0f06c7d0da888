// Document models - one module per collection plus pagination shapes

pub mod comment;
pub mod like;
pub mod pagination;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::Comment;
pub use like::{Like, LikeKind, LikedVideo, VideoSummary};
pub use pagination::{CommentPage, PageRequest, VideoPage};
pub use playlist::{NewPlaylist, Playlist, PopulatedPlaylist};
pub use subscription::{ChannelSummary, SubscribedChannel, Subscriber, Subscription};
pub use tweet::{PopulatedTweet, Tweet};
pub use user::{push_watch_history, ChannelProfile, NewUser, OwnerSummary, User};
pub use video::{
    NewVideo, PopulatedVideo, SortDirection, Video, VideoQuery, VideoSort, VideoSortField,
};
