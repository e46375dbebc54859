//! Known signatures of deprecated Google sign-in APIs.

/// Google Identity Services (`gapi.auth2` / platform.js sign-in).
pub const GIS_SIGNATURES: &[&str] = &[
    "gapi.auth2.init",
    "gapi.auth2.getAuthInstance",
    "gapi.auth2.authorize",
    "gapi.auth2.GoogleAuth",
    "gapi.auth2.GoogleUser",
    "gapi.auth2.BasicProfile",
    "gapi.auth2.AuthorizeResponse",
    "gapi.auth2.enableDebugLogs",
    "gapi.signin2.render",
    "GoogleAuth.attachClickHandler",
    "GoogleAuth.currentUser.get",
    "GoogleAuth.currentUser.listen",
    "GoogleAuth.disconnect",
    "GoogleAuth.grantOfflineAccess",
    "GoogleAuth.isSignedIn.get",
    "GoogleAuth.isSignedIn.listen",
    "GoogleAuth.signIn",
    "GoogleAuth.signOut",
    "GoogleAuth.then",
    "GoogleUser.disconnect",
    "GoogleUser.getAuthResponse",
    "GoogleUser.getBasicProfile",
    "GoogleUser.getGrantedScopes",
    "GoogleUser.getHostedDomain",
    "GoogleUser.getId",
    "GoogleUser.grant",
    "GoogleUser.grantOfflineAccess",
    "GoogleUser.hasGrantedScopes",
    "GoogleUser.isSignedIn",
    "GoogleUser.reloadAuthResponse",
];

/// One Tap prompt moment methods removed with FedCM migration.
pub const GSI_V2_SIGNATURES: &[&str] = &[
    "isDisplayMoment",
    "isDisplayed",
    "isNotDisplayed",
    "getNotDisplayedReason",
    "isSkippedMoment",
    "getSkippedReason",
    "isDismissedMoment",
    "getDismissedReason",
];

/// Evidence that the GSI client library is loaded at all.
pub const GSI_V2_MODULE_SIGNATURES: &[&str] =
    &["accounts.google.com/gsi/client", "google.accounts.id.initialize"];
