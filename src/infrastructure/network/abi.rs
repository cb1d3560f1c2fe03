// SPDX-License-Identifier: MIT

//! Contract interfaces for the protocol surface. Calldata is encoded with
//! `SolCall` and submitted through the gateway, so none of these carry
//! `#[sol(rpc)]` bindings.

use alloy::sol;

sol! {
    interface IErc20 {
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function symbol() external view returns (string);
        function name() external view returns (string);
        function decimals() external view returns (uint8);
    }

    interface IWrappedNative {
        function deposit() external payable;
        function withdraw(uint256 amount) external;
    }

    struct Route {
        address from;
        address to;
        bool stable;
    }

    interface IRouter {
        function swapExactTokensForTokens(
            uint256 amountIn,
            uint256 amountOutMin,
            Route[] calldata routes,
            address to,
            uint256 deadline
        ) external returns (uint256[] memory amounts);
        function swapExactTokensForTokensSupportingFeeOnTransferTokens(
            uint256 amountIn,
            uint256 amountOutMin,
            Route[] calldata routes,
            address to,
            uint256 deadline
        ) external;
        function swapExactETHForTokens(
            uint256 amountOutMin,
            Route[] calldata routes,
            address to,
            uint256 deadline
        ) external payable returns (uint256[] memory amounts);
        function swapExactTokensForETH(
            uint256 amountIn,
            uint256 amountOutMin,
            Route[] calldata routes,
            address to,
            uint256 deadline
        ) external returns (uint256[] memory amounts);
    }

    interface IVotingEscrow {
        function createLock(uint256 value, uint256 lockDuration) external returns (uint256);
        function increaseAmount(uint256 tokenId, uint256 value) external;
        function increaseUnlockTime(uint256 tokenId, uint256 lockDuration) external;
        function withdraw(uint256 tokenId) external;
        function merge(uint256 from, uint256 to) external;
        function locked(uint256 tokenId) external view returns (int128 amount, uint256 end);
        function balanceOfNFT(uint256 tokenId) external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
        function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256);
    }

    interface IVoter {
        function vote(uint256 tokenId, address[] calldata poolVote, int256[] calldata weights) external;
        function reset(uint256 tokenId) external;
        function votes(uint256 tokenId, address pool) external view returns (int256);
        function claimBribes(address[] memory bribes, address[][] memory tokens, uint256 tokenId) external;
        function isWhitelisted(address token) external view returns (bool);
        function listingFee() external view returns (uint256);
        function whitelist(address token) external;
    }

    interface IGauge {
        function earned(address token, address account) external view returns (uint256);
        function getReward(address account, address[] memory tokens) external;
        function balanceOf(address account) external view returns (uint256);
        function totalSupply() external view returns (uint256);
    }

    interface IBribe {
        function rewardTokensLength() external view returns (uint256);
        function rewardTokens(uint256 index) external view returns (address);
        function tokenIdToAddress(uint256 tokenId) external view returns (address);
        function earned(address token, address account) external view returns (uint256);
    }

    interface IVeDist {
        function claimable(uint256 tokenId) external view returns (uint256);
        function claim(uint256 tokenId) external returns (uint256);
    }

    interface IPair {
        function claimable0(address account) external view returns (uint256);
        function claimable1(address account) external view returns (uint256);
        function claimFees() external returns (uint256 claimed0, uint256 claimed1);
        function totalSupply() external view returns (uint256);
    }

    struct Call {
        address target;
        bytes callData;
    }

    interface IMulticall {
        function aggregate(Call[] memory calls) external returns (uint256 blockNumber, bytes[] memory returnData);
    }
}
