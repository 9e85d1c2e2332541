//! # Route scripts
//!
//! Every client platform gets the same blocks in a different shape: a
//! single route list for OpenVPN and RouterOS, or a pair of up and down
//! scripts that save the pre-VPN gateway and route the blocks through it.

use std::fmt;

use clap::ValueEnum;
use routes::cidr::CidrBlock;
use routes::region::Region;
use serde::Deserialize;

const LINUX_UP_HEADER: &str = r#"#!/bin/bash
export PATH="/bin:/sbin:/usr/sbin:/usr/bin"
OLDGW=$(ip route show | grep '^default' | sed -e 's/default via \([^ ]*\).*/\1/')
if [ "$OLDGW" == '' ]; then
    exit 0
fi
if [ ! -e /tmp/vpn_oldgw ]; then
    echo $OLDGW > /tmp/vpn_oldgw
fi
"#;

const LINUX_DOWN_HEADER: &str = r#"#!/bin/bash
export PATH="/bin:/sbin:/usr/sbin:/usr/bin"
OLDGW=$(cat /tmp/vpn_oldgw)
"#;

const MAC_UP_HEADER: &str = r#"#!/bin/sh
export PATH="/bin:/sbin:/usr/sbin:/usr/bin"
OLDGW=$(netstat -nr | grep '^default' | grep -v 'ppp' | sed 's/default *\([0-9\.]*\) .*/\1/' | awk '{if($1){print $1}}')
if [ ! -e /tmp/pptp_oldgw ]; then
    echo "${OLDGW}" > /tmp/pptp_oldgw
fi
dscacheutil -flushcache
route add 10.0.0.0/8 "${OLDGW}"
route add 172.16.0.0/12 "${OLDGW}"
route add 192.168.0.0/16 "${OLDGW}"
"#;

const MAC_DOWN_HEADER: &str = r#"#!/bin/sh
export PATH="/bin:/sbin:/usr/sbin:/usr/bin"
if [ ! -e /tmp/pptp_oldgw ]; then
        exit 0
fi
OLDGW=$(cat /tmp/pptp_oldgw)
route delete 10.0.0.0/8 "${OLDGW}"
route delete 172.16.0.0/12 "${OLDGW}"
route delete 192.168.0.0/16 "${OLDGW}"
"#;

const WIN_UP_HEADER: &str = r#"for /F "tokens=3" %%* in ('route print ^| findstr "\<0.0.0.0\>"') do set "gw=%%*"
ipconfig /flushdns

"#;

const WIN_DOWN_HEADER: &str = "@echo off\n";

const ANDROID_UP_HEADER: &str = r#"#!/bin/sh
alias netstat='/system/xbin/busybox netstat'
alias grep='/system/xbin/busybox grep'
alias awk='/system/xbin/busybox awk'
alias route='/system/xbin/busybox route'
OLDGW=$(netstat -rn | grep ^0\.0\.0\.0 | awk '{print $2}')
"#;

const ANDROID_DOWN_HEADER: &str = r#"#!/bin/sh
alias route='/system/xbin/busybox route'
"#;

/// Route entries beyond the generated ones that OpenVPN's `max-routes`
/// must leave room for.
const OPENVPN_ROUTE_HEADROOM: usize = 20;

/// The client platform scripts are generated for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// An OpenVPN `route` list.
    #[default]
    Openvpn,
    /// pppd hook scripts for Linux.
    Linux,
    /// pppd hook scripts for macOS.
    Mac,
    /// Batch files for Windows.
    Win,
    /// Busybox shell scripts for Android.
    Android,
    /// A MikroTik RouterOS address list.
    Routeos,
}

/// Settings that end up inside the generated scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Metric for openvpn and windows routes.
    pub metric: u32,
    /// Used as the RouterOS address-list name.
    pub region: Region,
}

/// A generated file, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFile {
    /// File name, relative to the output directory.
    pub name: &'static str,
    /// Full contents.
    pub contents: String,
    /// Whether the file is a shell script that should be executable.
    pub executable: bool,
}

impl ScriptFile {
    fn new(name: &'static str, contents: String, executable: bool) -> Self {
        Self {
            name,
            contents,
            executable,
        }
    }
}

/// Concatenate `header`, one line per block and `trailer`.
fn script<F>(header: &str, blocks: &[CidrBlock], line: F, trailer: &str) -> String
where
    F: Fn(&CidrBlock) -> String,
{
    let mut contents = String::from(header);
    for block in blocks {
        contents.push_str(&line(block));
        contents.push('\n');
    }
    contents.push_str(trailer);
    contents
}

impl Platform {
    /// The name used on the command line and in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Openvpn => "openvpn",
            Platform::Linux => "linux",
            Platform::Mac => "mac",
            Platform::Win => "win",
            Platform::Android => "android",
            Platform::Routeos => "routeos",
        }
    }

    /// Render `blocks` into the files this platform expects.
    pub fn render(&self, blocks: &[CidrBlock], options: &RenderOptions) -> Vec<ScriptFile> {
        match self {
            Platform::Openvpn => {
                let routes = script(
                    "",
                    blocks,
                    |b| {
                        format!(
                            "route {} {} net_gateway {}",
                            b.network_addr(),
                            b.netmask(),
                            options.metric
                        )
                    },
                    "",
                );
                vec![ScriptFile::new("routes.txt", routes, false)]
            }
            Platform::Linux => {
                let up = script(
                    LINUX_UP_HEADER,
                    blocks,
                    |b| {
                        format!(
                            "route add -net {} netmask {} gw $OLDGW",
                            b.network_addr(),
                            b.netmask()
                        )
                    },
                    "",
                );
                let down = script(
                    LINUX_DOWN_HEADER,
                    blocks,
                    |b| format!("route del -net {} netmask {}", b.network_addr(), b.netmask()),
                    "rm /tmp/vpn_oldgw\n",
                );
                vec![
                    ScriptFile::new("ip-pre-up", up, true),
                    ScriptFile::new("ip-down", down, true),
                ]
            }
            Platform::Mac => {
                let up = script(
                    MAC_UP_HEADER,
                    blocks,
                    |b| format!("route add {b} \"${{OLDGW}}\""),
                    "",
                );
                let down = script(
                    MAC_DOWN_HEADER,
                    blocks,
                    |b| format!("route delete {b} ${{OLDGW}}"),
                    "\n\nrm /tmp/pptp_oldgw\n",
                );
                vec![
                    ScriptFile::new("ip-up", up, true),
                    ScriptFile::new("ip-down", down, true),
                ]
            }
            Platform::Win => {
                let up = script(
                    WIN_UP_HEADER,
                    blocks,
                    |b| {
                        format!(
                            "route add {} mask {} %gw% metric {}",
                            b.network_addr(),
                            b.netmask(),
                            options.metric
                        )
                    },
                    "",
                );
                let down = script(
                    WIN_DOWN_HEADER,
                    blocks,
                    |b| format!("route delete {}", b.network_addr()),
                    "",
                );
                vec![
                    ScriptFile::new("vpnup.bat", up, false),
                    ScriptFile::new("vpndown.bat", down, false),
                ]
            }
            Platform::Android => {
                let up = script(
                    ANDROID_UP_HEADER,
                    blocks,
                    |b| {
                        format!(
                            "route add -net {} netmask {} gw $OLDGW",
                            b.network_addr(),
                            b.netmask()
                        )
                    },
                    "",
                );
                let down = script(
                    ANDROID_DOWN_HEADER,
                    blocks,
                    |b| format!("route del -net {} netmask {}", b.network_addr(), b.netmask()),
                    "",
                );
                vec![
                    ScriptFile::new("vpnup.sh", up, true),
                    ScriptFile::new("vpndown.sh", down, true),
                ]
            }
            Platform::Routeos => {
                let list = script(
                    "",
                    blocks,
                    |b| {
                        format!(
                            "/ip firewall address-list add list={} address={b}",
                            options.region
                        )
                    },
                    "",
                );
                vec![ScriptFile::new("routes.txt", list, false)]
            }
        }
    }

    /// How to install the files, shown once they are written.
    pub fn usage(&self, block_count: usize, options: &RenderOptions) -> String {
        match self {
            Platform::Openvpn => format!(
                "Usage: Append the content of the newly created routes.txt to your openvpn config file, \
                 and also add 'max-routes {}', which takes a line, to the head of the file.",
                block_count + OPENVPN_ROUTE_HEADROOM
            ),
            Platform::Linux => "For pptp only, please copy the file ip-pre-up to the folder /etc/ppp, \
                 please copy the file ip-down to the folder /etc/ppp/ip-down.d."
                .to_string(),
            Platform::Mac => "For pptp on mac only, please copy ip-up and ip-down to the /etc/ppp folder, \
                 don't forget to make them executable with the chmod command."
                .to_string(),
            Platform::Win => "For pptp on windows only, run vpnup.bat before dialing to vpn, \
                 and run vpndown.bat after disconnected from the vpn."
                .to_string(),
            Platform::Android => "Old school way to call up/down script from openvpn client. \
                 use the regular openvpn 2.1 method to add routes if it's possible"
                .to_string(),
            Platform::Routeos => format!(
                "Import routes.txt on the router with '/import file-name=routes.txt'. Remove the list again \
                 with '/ip firewall address-list remove [/ip firewall address-list find list=\"{}\"]'.",
                options.region
            ),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn blocks() -> Vec<CidrBlock> {
        vec![
            CidrBlock::new(0x0100_0000, 23).unwrap(),
            CidrBlock::new(0x0100_1000, 20).unwrap(),
        ]
    }

    fn options() -> RenderOptions {
        RenderOptions {
            metric: 5,
            region: Region::China,
        }
    }

    fn render(platform: Platform) -> Vec<ScriptFile> {
        platform.render(&blocks(), &options())
    }

    #[test_case(Platform::Openvpn => vec!["routes.txt"]; "openvpn")]
    #[test_case(Platform::Linux => vec!["ip-pre-up", "ip-down"]; "linux")]
    #[test_case(Platform::Mac => vec!["ip-up", "ip-down"]; "mac")]
    #[test_case(Platform::Win => vec!["vpnup.bat", "vpndown.bat"]; "win")]
    #[test_case(Platform::Android => vec!["vpnup.sh", "vpndown.sh"]; "android")]
    #[test_case(Platform::Routeos => vec!["routes.txt"]; "routeos")]
    fn file_names(platform: Platform) -> Vec<&'static str> {
        render(platform).iter().map(|file| file.name).collect()
    }

    #[test]
    fn openvpn_routes_use_the_net_gateway() {
        let files = render(Platform::Openvpn);
        assert_eq!(
            files[0].contents,
            "route 1.0.0.0 255.255.254.0 net_gateway 5\n\
             route 1.0.16.0 255.255.240.0 net_gateway 5\n"
        );
        assert!(!files[0].executable);
    }

    #[test]
    fn linux_scripts_save_and_restore_the_gateway() {
        let files = render(Platform::Linux);
        let (up, down) = (&files[0].contents, &files[1].contents);

        assert!(up.starts_with("#!/bin/bash\n"));
        assert!(up.contains(r"sed -e 's/default via \([^ ]*\).*/\1/'"));
        assert!(up.ends_with(
            "route add -net 1.0.0.0 netmask 255.255.254.0 gw $OLDGW\n\
             route add -net 1.0.16.0 netmask 255.255.240.0 gw $OLDGW\n"
        ));
        assert!(down.starts_with(LINUX_DOWN_HEADER));
        assert!(down.ends_with(
            "route del -net 1.0.16.0 netmask 255.255.240.0\nrm /tmp/vpn_oldgw\n"
        ));
        assert!(files.iter().all(|file| file.executable));
    }

    #[test]
    fn mac_scripts_use_prefix_notation() {
        let files = render(Platform::Mac);
        let (up, down) = (&files[0].contents, &files[1].contents);

        assert!(up.contains("route add 192.168.0.0/16 \"${OLDGW}\"\n"));
        assert!(up.ends_with("route add 1.0.16.0/20 \"${OLDGW}\"\n"));
        assert!(down.contains("OLDGW=$(cat /tmp/pptp_oldgw)\n"));
        assert!(down.contains("route delete 1.0.0.0/23 ${OLDGW}\n"));
        assert!(down.ends_with("\n\nrm /tmp/pptp_oldgw\n"));
    }

    #[test]
    fn windows_scripts_route_through_the_saved_gateway() {
        let files = render(Platform::Win);
        let (up, down) = (&files[0].contents, &files[1].contents);

        assert!(up.contains("ipconfig /flushdns\n\n"));
        assert!(up.contains("do set \"gw=%%*\"\n"));
        assert!(up.ends_with("route add 1.0.16.0 mask 255.255.240.0 %gw% metric 5\n"));
        assert_eq!(down, "@echo off\nroute delete 1.0.0.0\nroute delete 1.0.16.0\n");
    }

    #[test]
    fn android_scripts_use_busybox() {
        let files = render(Platform::Android);
        assert!(files[0].contents.contains("alias route='/system/xbin/busybox route'\n"));
        assert!(files[0]
            .contents
            .ends_with("route add -net 1.0.16.0 netmask 255.255.240.0 gw $OLDGW\n"));
        assert_eq!(
            files[1].contents,
            "#!/bin/sh\nalias route='/system/xbin/busybox route'\n\
             route del -net 1.0.0.0 netmask 255.255.254.0\n\
             route del -net 1.0.16.0 netmask 255.255.240.0\n"
        );
    }

    #[test]
    fn routeos_list_is_named_after_the_region() {
        let files = render(Platform::Routeos);
        assert_eq!(
            files[0].contents,
            "/ip firewall address-list add list=china address=1.0.0.0/23\n\
             /ip firewall address-list add list=china address=1.0.16.0/20\n"
        );
    }

    #[test]
    fn empty_route_list_still_has_headers() {
        let files = Platform::Linux.render(&[], &options());
        assert_eq!(files[0].contents, LINUX_UP_HEADER);
        assert_eq!(files[1].contents, format!("{LINUX_DOWN_HEADER}rm /tmp/vpn_oldgw\n"));
    }

    #[test]
    fn openvpn_usage_leaves_headroom() {
        assert!(Platform::Openvpn
            .usage(100, &options())
            .contains("'max-routes 120'"));
        assert!(Platform::Routeos
            .usage(100, &options())
            .contains("find list=\"china\""));
    }

    #[test]
    fn names_round_trip_through_clap() {
        for platform in Platform::value_variants() {
            assert_eq!(Platform::from_str(platform.as_str(), false), Ok(*platform));
        }
    }
}
